use std::path::{Path, PathBuf};

use jmdex_core::sentences::resolve_to_file;

use super::load_settings;

/// Resolve `input` against `jmdict`. Without `output`, the example store
/// is written next to `jmdict` under its configured name.
pub fn examples(input: &str, output: Option<&str>, jmdict: &str, config: Option<&str>) {
    let settings = load_settings(config);
    let jmdict = Path::new(jmdict);
    let output = match output {
        Some(path) => PathBuf::from(path),
        None => jmdict
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&settings.examples.example_store),
    };

    eprintln!("Resolving {input} against {}...", jmdict.display());
    let report = die!(
        resolve_to_file(Path::new(input), &output, jmdict),
        "Error resolving examples: {}"
    );

    for ambiguity in &report.ambiguous {
        eprintln!(
            "Ambiguous: {} in {} (line {}, {} entries)",
            ambiguity.writing,
            ambiguity.contents,
            ambiguity.line,
            ambiguity.matches.len()
        );
    }
    eprintln!("  Examples:   {}", report.examples);
    eprintln!("  References: {}", report.references);
    eprintln!("  Unresolved: {}", report.unresolved);
    eprintln!("  Ambiguous:  {}", report.ambiguous.len());
    eprintln!("Wrote {}", output.display());
}
