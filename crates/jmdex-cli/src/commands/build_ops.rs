use std::path::Path;

use jmdex_core::build::build_to_directory;

use super::load_settings;

pub fn build(input: &str, output_dir: &str, version: Option<String>, config: Option<&str>) {
    let settings = load_settings(config);

    eprintln!("Building {input} into {output_dir}...");
    let report = die!(
        build_to_directory(Path::new(input), Path::new(output_dir), &settings, version),
        "Error building index: {}"
    );

    let stats = report.stats;
    eprintln!(
        "  Entries:      {} ({} skipped)",
        stats.entries, stats.skipped_entries
    );
    eprintln!(
        "  Translations: {} ({} skipped, {} filtered)",
        stats.translations, stats.skipped_translations, stats.filtered_translations
    );
    eprintln!("  Entities:     {}", report.entities);
    eprintln!("  Languages:    {}", report.languages.join(" "));
}
