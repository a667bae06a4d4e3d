use std::fs;

pub fn romaji_export() {
    print!("{}", jmdex_core::romaji::default_toml());
}

pub fn romaji_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let table = die!(jmdex_core::romaji::RomajiTable::parse(&content), "Error: {}");
    println!("OK: {} mappings", table.mapping_count());
}

pub fn settings_export() {
    print!("{}", jmdex_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        jmdex_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    let languages = if s.build.languages.is_empty() {
        "all".to_string()
    } else {
        s.build.languages.join(",")
    };
    println!(
        "OK: build.primary_language={}, build.languages={}, build.entry_store={}, index.include_self={}",
        s.build.primary_language, languages, s.build.entry_store, s.index.include_self
    );
}
