//! Pipeline settings loaded from TOML.
//!
//! Defaults are embedded via `include_str!("default_settings.toml")`; a custom
//! file must spell out every section.

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub build: BuildSettings,
    pub index: IndexSettings,
    pub examples: ExampleSettings,
}

impl Settings {
    /// The embedded defaults.
    pub fn defaults() -> Self {
        // build.rs validates the embedded file.
        parse_settings_toml(DEFAULT_SETTINGS_TOML).expect("default settings TOML must be valid")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    pub primary_language: String,
    #[serde(default)]
    pub languages: Vec<String>,
    pub entry_store: String,
}

impl BuildSettings {
    /// Whether translations in `lang` should be written.
    pub fn wants_language(&self, lang: &str) -> bool {
        self.languages.is_empty() || self.languages.iter().any(|l| l == lang)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexSettings {
    pub include_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExampleSettings {
    pub example_store: String,
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

/// A language code as used for `<lang>.db` names and `ATTACH` aliases:
/// two or three lowercase ASCII letters.
pub fn is_language_code(code: &str) -> bool {
    (2..=3).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_lowercase())
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    macro_rules! check_non_empty {
        ($section:ident . $field:ident) => {
            if s.$section.$field.trim().is_empty() {
                return Err(SettingsError::InvalidValue {
                    field: concat!(stringify!($section), ".", stringify!($field)).to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        };
    }

    check_non_empty!(build.primary_language);
    check_non_empty!(build.entry_store);
    check_non_empty!(examples.example_store);

    if !is_language_code(&s.build.primary_language) {
        return Err(SettingsError::InvalidValue {
            field: "build.primary_language".to_string(),
            reason: format!("{:?} is not a 2-3 letter lowercase code", s.build.primary_language),
        });
    }
    for (i, lang) in s.build.languages.iter().enumerate() {
        if !is_language_code(lang) {
            return Err(SettingsError::InvalidValue {
                field: format!("build.languages[{i}]"),
                reason: format!("{lang:?} is not a 2-3 letter lowercase code"),
            });
        }
    }

    Ok(())
}
