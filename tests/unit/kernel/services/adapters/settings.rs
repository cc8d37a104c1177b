use super::*;
use std::time::Instant;

use crate::core::command::Command;
use crate::kernel::keymap::{LocalPrecedence, Lookup, LookupContext, MapRhs};
use crate::kernel::resolver::Resolution;

fn rule(mode: &str, lhs: &str, rhs: &str) -> MappingRule {
    MappingRule {
        mode: mode.to_string(),
        lhs: lhs.to_string(),
        rhs: rhs.to_string(),
        noremap: false,
        script: false,
        nowait: false,
        unique: false,
        function: None,
    }
}

#[test]
fn default_settings_file_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    write_default_settings(&path).unwrap();
    assert_eq!(load_settings(&path).unwrap(), Settings::default());

    std::fs::write(&path, r#"{"timeoutlen": 300}"#).unwrap();
    write_default_settings(&path).unwrap();
    assert_eq!(load_settings(&path).unwrap().timeoutlen, 300);
}

#[test]
fn partial_json_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "leader": "<Space>",
            "local_precedence": "merged",
            "mappings": [{ "mode": "i", "lhs": "jk", "rhs": "<Esc>" }]
        }"#,
    )
    .unwrap();
    let settings = load_settings(&path).unwrap();
    assert_eq!(settings.leader, "<Space>");
    assert_eq!(settings.local_precedence, LocalPrecedence::Merged);
    assert_eq!(settings.timeoutlen, 1000);
    assert_eq!(settings.interrupt_key.as_deref(), Some("<C-c>"));
    assert_eq!(settings.mappings, vec![rule("i", "jk", "<Esc>")]);
}

#[test]
fn broken_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_settings(&path), Err(SettingsError::Json(_))));
    assert!(matches!(
        load_settings(&dir.path().join("missing.json")),
        Err(SettingsError::Io(_))
    ));
}

#[test]
fn resolver_config_follows_timeout_switches() {
    let notation = Notation::new(Encoding::utf8());
    let mut settings = Settings::default();
    let config = resolver_config(&settings, &notation).unwrap();
    assert_eq!(config.timeout, Some(Duration::from_millis(1000)));
    assert_eq!(config.interrupt_key, Some(vec![0x03]));

    settings.timeout = false;
    settings.interrupt_key = None;
    settings.maxmapdepth = 20;
    let config = resolver_config(&settings, &notation).unwrap();
    assert_eq!(config.timeout, None);
    assert_eq!(config.interrupt_key, None);
    assert_eq!(config.max_depth, 20);
}

#[test]
fn session_config_uses_encoding_and_key_timeout() {
    let settings = Settings {
        encoding: "latin1".to_string(),
        ttimeoutlen: 0,
        ..Settings::default()
    };
    let config = session_config(&settings).unwrap();
    assert_eq!(config.encoding.name(), "latin1");
    assert_eq!(config.key_timeout, Some(Duration::ZERO));
}

#[test]
fn rule_flags_become_spec_flags() {
    let notation = Notation::new(Encoding::utf8());

    let mut noremap = rule("n", "<Leader>w", ":w<CR>");
    noremap.noremap = true;
    noremap.nowait = true;
    let spec = mapping_spec(&noremap, &notation).unwrap();
    assert_eq!(spec.lhs, b"\\w");
    assert_eq!(spec.rhs, MapRhs::Keys(b":w\r".to_vec()));
    assert_eq!(spec.modes, MapModes::NORMAL);
    assert_eq!(spec.remap, Remap::None);
    assert!(spec.nowait);

    let mut script = rule("", "s", "x");
    script.script = true;
    script.noremap = true;
    let spec = mapping_spec(&script, &notation).unwrap();
    assert_eq!(spec.remap, Remap::Script);
    assert!(spec.script_local);
    assert_eq!(spec.modes, MapModes::NVO);

    let mut function = rule("n", "<F2>", "");
    function.function = Some("save".to_string());
    let spec = mapping_spec(&function, &notation).unwrap();
    assert_eq!(spec.rhs, MapRhs::Function("save".into()));
}

#[test]
fn bad_mode_letters_are_reported() {
    let notation = Notation::new(Encoding::utf8());
    assert_eq!(
        mapping_spec(&rule("z", "a", "b"), &notation).unwrap_err(),
        MapError::InvalidModes("z".to_string())
    );
}

#[test]
fn bad_rules_are_collected_and_good_ones_installed() {
    let settings = Settings {
        mappings: vec![
            rule("i", "jj", "<Esc>"),
            rule("q", "x", "y"),
            rule("n", "", "y"),
            rule("n", "<Char-zz>", "y"),
        ],
        ..Settings::default()
    };
    let notation = Notation::new(Encoding::utf8());
    let mut table = MappingTable::new();
    let errors = apply_mappings(&settings, &notation, &mut table);
    assert_eq!(table.len(), 1);
    let indexes: Vec<usize> = errors
        .iter()
        .map(|e| match e {
            SettingsError::Mapping { index, .. } => *index,
            other => panic!("unexpected {other}"),
        })
        .collect();
    assert_eq!(indexes, vec![1, 2, 3]);
    assert!(matches!(
        table.lookup(b"jj", &LookupContext::new(MapModes::INSERT, None)),
        Lookup::Exact(_)
    ));
}

#[test]
fn invalid_leader_fails_the_build() {
    let settings = Settings {
        leader: String::new(),
        ..Settings::default()
    };
    assert!(matches!(
        build_session(&settings),
        Err(SettingsError::Notation(NotationError::InvalidLeader(_)))
    ));
}

#[test]
fn built_session_resolves_configured_mapping() {
    let settings = Settings {
        mappings: vec![rule("n", "<Space>q", "<C-q>")],
        ..Settings::default()
    };
    let (mut session, errors) = build_session(&settings).unwrap();
    assert!(errors.is_empty());
    let now = Instant::now();
    session.feed(b" q", now);
    match session.poll(now) {
        Resolution::Command(Command::Key { key, .. }) => assert_eq!(key.code, 0x11),
        other => panic!("unexpected {other:?}"),
    }
}
