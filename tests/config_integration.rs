use std::path::PathBuf;

use inkshade::config::{ConfigFlags, load_config_flags, parse_flag_tokens};
use inkshade::theme::Preference;

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".inkshaderc");
    let content = r#"
# comment
--watch

--theme light

--store-dir=stores
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.watch);
    assert_eq!(flags.theme, Some(Preference::Light));
    assert_eq!(flags.store_dir, Some(PathBuf::from("stores")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".inkshaderc");
    let content = "--watch\n--theme light\n--sync-url http://file.example\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "inkshade".to_string(),
        "--theme".to_string(),
        "dark".to_string(),
        "--no-sync".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.watch, "file flags should remain enabled");
    assert!(effective.no_sync, "cli flags should be applied");
    assert_eq!(effective.theme, Some(Preference::Dark), "cli should override theme");
    assert_eq!(
        effective.sync_url.as_deref(),
        Some("http://file.example"),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "inkshade".to_string(),
        "--theme=auto".to_string(),
        "--sync-url=http://x".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.theme, Some(Preference::Auto));
    assert_eq!(flags.sync_url.as_deref(), Some("http://x"));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        watch: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        no_sync: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.watch);
    assert!(merged.no_sync);
}
