//! First pass: stream the dictionary source into the entry and translation
//! stores.
//!
//! Everything is written inside the stores' open transactions; only after
//! the whole document parsed do entities, control values and the full-text
//! rebuild go in, followed by the commits. Any error before that point drops
//! the stores uncommitted.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::accumulator::{Accumulator, ParseError};
use crate::markup::{parse_markup, Attributes, MarkupError, MarkupHandler};
use crate::settings::{is_language_code, BuildSettings, Settings};
use crate::store::{EntryStore, Inserted, LanguageRegistry, StoreError};
use crate::writer::{IndexWriter, WriteStats};

#[cfg(test)]
mod tests;

pub const CONTROL_VERSION: &str = "version";
pub const CONTROL_PRIMARY_LANGUAGE: &str = "primaryLanguage";
/// Space-separated codes of the translation stores written by the pass.
pub const CONTROL_LANGUAGES: &str = "languages";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("cannot read {}: {source}", path.display())]
    Input { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("malformed dictionary: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub build: BuildSettings,
    pub include_self: bool,
    /// Date stamp recorded as the `version` control value.
    pub version: Option<String>,
}

impl BuildOptions {
    pub fn from_settings(settings: &Settings, version: Option<String>) -> Self {
        Self {
            build: settings.build.clone(),
            include_self: settings.index.include_self,
            version,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::defaults(), None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub stats: WriteStats,
    pub entities: usize,
    /// Languages that received a translation store.
    pub languages: Vec<String>,
}

struct BuildHandler<'a> {
    accumulator: Accumulator,
    writer: IndexWriter<'a>,
    entities: Vec<(String, String)>,
}

impl MarkupHandler for BuildHandler<'_> {
    type Error = BuildError;

    fn start_element(&mut self, name: &str, attrs: &Attributes) -> Result<(), BuildError> {
        Ok(self.accumulator.start_element(name, attrs)?)
    }

    fn end_element(&mut self, name: &str) -> Result<(), BuildError> {
        if let Some(record) = self.accumulator.end_element(name)? {
            self.writer.write_record(&record)?;
        }
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<(), BuildError> {
        self.accumulator.characters(text);
        Ok(())
    }

    fn entity_declared(&mut self, name: &str, content: &str) -> Result<(), BuildError> {
        self.entities.push((name.to_string(), content.to_string()));
        Ok(())
    }

    fn end_document(&mut self) -> Result<(), BuildError> {
        Ok(self.accumulator.end_document()?)
    }
}

/// Run the first pass over `source` and commit every store.
pub fn build_index<R: BufRead>(
    source: R,
    entries: &mut EntryStore,
    languages: &mut LanguageRegistry,
    options: &BuildOptions,
) -> Result<BuildReport, BuildError> {
    let mut handler = BuildHandler {
        accumulator: Accumulator::new(options.build.primary_language.as_str()),
        writer: IndexWriter::new(entries, languages, options),
        entities: Vec::new(),
    };
    parse_markup(source, &mut handler)?;
    let stats = handler.writer.stats();
    let declared = handler.entities;

    let mut entity_count = 0;
    for (name, content) in &declared {
        match entries.insert_entity(name, content)? {
            Inserted::Row => entity_count += 1,
            Inserted::Skipped => warn!(entity = %name, "duplicate entity declaration skipped"),
        }
    }

    if let Some(version) = &options.version {
        entries.set_control(CONTROL_VERSION, version)?;
    }
    entries.set_control(CONTROL_PRIMARY_LANGUAGE, &options.build.primary_language)?;
    let built: Vec<String> = languages.languages().map(str::to_string).collect();
    entries.set_control(CONTROL_LANGUAGES, &built.join(" "))?;
    entries.rebuild_index()?;
    languages.rebuild_indexes()?;

    // Only COMMIT itself can fail from here on. The entry store commits
    // last since its control values describe the finished pass.
    languages.commit()?;
    entries.commit()?;

    let report = BuildReport {
        stats,
        entities: entity_count,
        languages: built,
    };
    info!(
        entries = report.stats.entries,
        skipped = report.stats.skipped_entries,
        translations = report.stats.translations,
        languages = report.languages.len(),
        "dictionary index built"
    );
    Ok(report)
}

/// Build `input` into `out_dir`: the entry store under its configured name
/// and one `<lang>.db` per translation language.
pub fn build_to_directory(
    input: &Path,
    out_dir: &Path,
    settings: &Settings,
    version: Option<String>,
) -> Result<BuildReport, BuildError> {
    let file = File::open(input).map_err(|source| BuildError::Input {
        path: input.to_path_buf(),
        source,
    })?;
    fs::create_dir_all(out_dir).map_err(StoreError::from)?;

    let mut entries = EntryStore::create(&out_dir.join(&settings.build.entry_store))?;
    let mut languages = LanguageRegistry::in_directory(out_dir);
    info!(input = %input.display(), out_dir = %out_dir.display(), "building dictionary index");

    let report = build_index(
        BufReader::new(file),
        &mut entries,
        &mut languages,
        &BuildOptions::from_settings(settings, version),
    )?;
    remove_stale_languages(out_dir, &report.languages, settings)?;
    Ok(report)
}

/// Delete `<lang>.db` files in `out_dir` that an earlier pass wrote and the
/// finished one did not.
fn remove_stale_languages(
    out_dir: &Path,
    built: &[String],
    settings: &Settings,
) -> Result<(), StoreError> {
    for dirent in fs::read_dir(out_dir)? {
        let path = dirent?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(lang) = name.strip_suffix(".db") else {
            continue;
        };
        if !is_language_code(lang)
            || built.iter().any(|b| b == lang)
            || name == settings.build.entry_store
            || name == settings.examples.example_store
        {
            continue;
        }
        info!(lang, path = %path.display(), "removing stale translation store");
        fs::remove_file(&path)?;
    }
    Ok(())
}
