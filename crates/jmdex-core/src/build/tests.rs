use super::*;
use crate::entry::{MetadataArray, MetadataKind};

const JMDICT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE JMdict [
<!ELEMENT JMdict (entry*)>
<!ENTITY v1 "Ichidan verb">
<!ENTITY uk "word usually written using kana alone">
<!ENTITY n "noun (common) (futsuumeishi)">
]>
<JMdict>
<entry>
<ent_seq>1358280</ent_seq>
<k_ele><keb>食べる</keb><ke_pri>ichi1</ke_pri></k_ele>
<k_ele><keb>喰べる</keb></k_ele>
<r_ele><reb>たべる</reb><re_pri>ichi1</re_pri></r_ele>
<sense><pos>&v1;</pos><gloss>to eat</gloss></sense>
<sense><gloss>to live on (e.g. a salary)</gloss></sense>
<sense><gloss xml:lang="fre">manger</gloss></sense>
<sense><gloss xml:lang="eng">to dine</gloss></sense>
</entry>
<entry>
<ent_seq>2</ent_seq>
<k_ele><keb>食べる</keb></k_ele>
<r_ele><reb>くらう</reb><re_nokanji/></r_ele>
<sense><pos>&v1;</pos><misc>&uk;</misc><gloss>to eat (vulgar)</gloss></sense>
</entry>
</JMdict>
"#;

fn build_in_memory(
    source: &str,
    options: &BuildOptions,
) -> (Result<BuildReport, BuildError>, EntryStore, LanguageRegistry) {
    let mut entries = EntryStore::in_memory().unwrap();
    let mut languages = LanguageRegistry::in_memory();
    let result = build_index(source.as_bytes(), &mut entries, &mut languages, options);
    (result, entries, languages)
}

#[test]
fn test_build_report() {
    let (result, entries, _) = build_in_memory(JMDICT, &BuildOptions::default());
    let report = result.unwrap();
    assert_eq!(report.stats.entries, 2);
    assert_eq!(report.stats.translations, 4);
    assert_eq!(report.entities, 3);
    assert_eq!(report.languages, ["eng", "fre"]);
    assert!(entries.is_committed());
}

#[test]
fn test_language_switch_flushes_once_per_run() {
    let (result, _, languages) = build_in_memory(JMDICT, &BuildOptions::default());
    result.unwrap();
    assert_eq!(
        languages.get("eng").unwrap().glosses(1358280).unwrap(),
        vec![
            r#"[["to eat"],["to live on (e.g. a salary)"]]"#.to_string(),
            r#"[["to dine"]]"#.to_string(),
        ]
    );
    assert_eq!(
        languages.get("fre").unwrap().glosses(1358280).unwrap(),
        vec![r#"[["manger"]]"#.to_string()]
    );
}

#[test]
fn test_entities_resolve_to_codes() {
    let (result, entries, _) = build_in_memory(JMDICT, &BuildOptions::default());
    result.unwrap();

    let taberu = entries.load_entry(1358280).unwrap().unwrap();
    assert_eq!(
        taberu.metadata(MetadataKind::Pos),
        &MetadataArray::Groups(vec![vec!["v1".to_string()], vec![], vec![]])
    );
    assert_eq!(taberu.metadata(MetadataKind::Misc), &MetadataArray::Absent);
    assert_eq!(taberu.writings.priority, vec!["食べる".to_string()]);
    assert_eq!(taberu.writings.ordinary, vec!["喰べる".to_string()]);

    let kurau = entries.load_entry(2).unwrap().unwrap();
    assert_eq!(
        kurau.metadata(MetadataKind::Misc),
        &MetadataArray::Groups(vec![vec!["uk".to_string()]])
    );
    assert_eq!(entries.entity("v1").unwrap().as_deref(), Some("Ichidan verb"));
}

#[test]
fn test_control_values() {
    let options = BuildOptions {
        version: Some("20240115".to_string()),
        ..BuildOptions::default()
    };
    let (result, entries, _) = build_in_memory(JMDICT, &options);
    result.unwrap();
    assert_eq!(entries.control(CONTROL_VERSION).unwrap().as_deref(), Some("20240115"));
    assert_eq!(entries.control(CONTROL_PRIMARY_LANGUAGE).unwrap().as_deref(), Some("eng"));
    assert_eq!(entries.control(CONTROL_LANGUAGES).unwrap().as_deref(), Some("eng fre"));
}

#[test]
fn test_built_index_is_searchable() {
    let (result, entries, _) = build_in_memory(JMDICT, &BuildOptions::default());
    result.unwrap();
    assert_eq!(entries.seqs_by_writing("食べる").unwrap(), vec![2, 1358280]);
    assert_eq!(
        entries.seqs_by_writing_and_reading("食べる", "たべる").unwrap(),
        vec![1358280]
    );
}

#[test]
fn test_sense_close_outside_entry_fails() {
    let source = "<JMdict><sense><gloss>stray</gloss></sense></JMdict>";
    let (result, entries, _) = build_in_memory(source, &BuildOptions::default());
    assert!(matches!(
        result,
        Err(BuildError::Parse(ParseError::UnexpectedClose { .. }))
    ));
    assert!(!entries.is_committed());
}

#[test]
fn test_mismatched_tags_fail() {
    let source = "<JMdict><entry><ent_seq>1</ent_seq></sense></JMdict>";
    let (result, _, _) = build_in_memory(source, &BuildOptions::default());
    assert!(matches!(result, Err(BuildError::Markup(_))));
}

#[test]
fn test_failed_rebuild_keeps_prior_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("JMdict.xml");
    let out = dir.path().join("out");
    let settings = Settings::defaults();

    fs::write(&input, JMDICT).unwrap();
    build_to_directory(&input, &out, &settings, None).unwrap();

    fs::write(&input, JMDICT.replace("<ent_seq>2</ent_seq>", "<ent_seq>2x</ent_seq>")).unwrap();
    let err = build_to_directory(&input, &out, &settings, None).unwrap_err();
    assert!(matches!(err, BuildError::Parse(ParseError::InvalidSequence(_))));

    let entries = EntryStore::open(&out.join("jmdict.db")).unwrap();
    assert!(entries.load_entry(1358280).unwrap().is_some());
    assert!(entries.load_entry(2).unwrap().is_some());
    assert_eq!(entries.seqs_by_writing("喰べる").unwrap(), vec![1358280]);
    drop(entries);

    // A clean rerun reproduces the first build.
    fs::write(&input, JMDICT).unwrap();
    let report = build_to_directory(&input, &out, &settings, None).unwrap();
    assert_eq!(report.stats.entries, 2);
    assert_eq!(report.stats.skipped_entries, 0);
}

#[test]
fn test_language_whitelist() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("JMdict.xml");
    fs::write(&input, JMDICT).unwrap();

    let mut settings = Settings::defaults();
    settings.build.languages = vec!["eng".to_string()];
    let report = build_to_directory(&input, dir.path(), &settings, None).unwrap();

    assert_eq!(report.languages, ["eng"]);
    assert_eq!(report.stats.filtered_translations, 1);
    assert!(dir.path().join("eng.db").exists());
    assert!(!dir.path().join("fre.db").exists());
}

#[test]
fn test_narrower_rebuild_drops_old_language_stores() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("JMdict.xml");
    let out = dir.path().join("out");
    fs::write(&input, JMDICT).unwrap();

    let mut settings = Settings::defaults();
    build_to_directory(&input, &out, &settings, None).unwrap();
    assert!(out.join("fre.db").exists());
    fs::write(out.join("examples.db"), b"").unwrap();

    settings.build.languages = vec!["eng".to_string()];
    build_to_directory(&input, &out, &settings, None).unwrap();

    assert!(out.join("eng.db").exists());
    assert!(!out.join("fre.db").exists());
    assert!(out.join("jmdict.db").exists());
    assert!(out.join("examples.db").exists());
    let entries = EntryStore::open(&out.join("jmdict.db")).unwrap();
    assert_eq!(entries.control(CONTROL_LANGUAGES).unwrap().as_deref(), Some("eng"));
}

#[test]
fn test_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_to_directory(
        &dir.path().join("absent.xml"),
        dir.path(),
        &Settings::defaults(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::Input { .. }));
}
