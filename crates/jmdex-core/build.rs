fn main() {
    // The embedded defaults are parsed with `expect` at runtime, so a broken
    // file has to fail the build instead.
    check(
        "src/default_settings.toml",
        include_str!("src/default_settings.toml"),
        &["build", "index", "examples"],
    );
    check(
        "src/romaji/default_romaji.toml",
        include_str!("src/romaji/default_romaji.toml"),
        &["mappings"],
    );
}

fn check(path: &str, content: &str, sections: &[&str]) {
    println!("cargo:rerun-if-changed={path}");
    let table: toml::Table = match content.parse() {
        Ok(table) => table,
        Err(e) => panic!("{path} is not valid TOML: {e}"),
    };
    for section in sections {
        if !table.get(*section).is_some_and(toml::Value::is_table) {
            panic!("{path} is missing the [{section}] table");
        }
    }
}
