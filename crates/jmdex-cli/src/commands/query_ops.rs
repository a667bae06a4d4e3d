use std::path::Path;

use jmdex_core::query::{self, QueryHit};

use super::load_settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum QueryMode {
    /// Priority writing equal to the expression
    Exact,
    /// Reading equal to the expression in any kana script or romaji
    Reading,
    /// Writing or reading containing the expression
    Substring,
}

pub fn query(dir: &str, lang: &str, expr: &str, mode: QueryMode, config: Option<&str>) {
    let settings = load_settings(config);
    let store = die!(
        query::open_index(Path::new(dir), &settings.build.entry_store, lang),
        "Error opening index in {dir}: {}"
    );

    let hits = die!(
        match mode {
            QueryMode::Exact => query::lookup_exact_writing(&store, lang, expr),
            QueryMode::Reading => query::lookup_reading(&store, lang, expr),
            QueryMode::Substring => query::lookup_substring(&store, lang, expr),
        },
        "Error querying: {}"
    );

    if hits.is_empty() {
        eprintln!("No results for {expr}");
        return;
    }
    for hit in &hits {
        println!("{}", format_hit(hit));
    }
}

fn format_hit(hit: &QueryHit) -> String {
    let join = |a: &[String], b: &[String]| {
        a.iter()
            .chain(b)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let entry = &hit.entry;
    let glosses = serde_json::to_string(&hit.translations).unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}",
        entry.seq,
        join(&entry.writings.priority, &entry.writings.ordinary),
        join(&entry.readings.priority, &entry.readings.ordinary),
        glosses
    )
}
