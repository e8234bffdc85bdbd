use std::fs;
use std::path::PathBuf;

use curator_config::{ConfigError, ConfigOverrides, load, loader::ENV_LOG_LEVEL};

#[test]
fn loads_document_from_disk_and_layers_environment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("curator.yaml");
    fs::write(
        &path,
        r"
library:
  base_path: /srv/incoming
  destination_path: /srv/uhd
  accepted_file_types: [mkv]
scan:
  recursive: true
  exclude_patterns: ['@skip_fluff']
evaluation:
  min_width: 3000
  min_height: 2000
concurrency:
  moves: 2
",
    )?;

    let config = load(
        Some(&path),
        |key| (key == ENV_LOG_LEVEL).then(|| "debug".to_string()),
        &ConfigOverrides::default(),
    )?;

    assert_eq!(config.library.base_path, PathBuf::from("/srv/incoming"));
    assert_eq!(config.library.accepted_file_types, vec!["mkv"]);
    assert_eq!(config.evaluation.min_width, 3000);
    assert_eq!(config.concurrency.moves, 2);
    assert_eq!(config.concurrency.evaluations, 8);
    assert_eq!(config.telemetry.log_level, "debug");
    assert!(
        config
            .scan
            .expanded_exclude_patterns()
            .contains(&"**/sample".to_string())
    );
    Ok(())
}

#[test]
fn missing_document_reports_io_error() {
    let err = load(
        Some(std::path::Path::new("/definitely/not/here/curator.yaml")),
        |_| None,
        &ConfigOverrides::default(),
    )
    .expect_err("missing file");
    assert!(matches!(
        err,
        ConfigError::Io {
            operation: "config.read",
            ..
        }
    ));
}

#[test]
fn malformed_document_reports_parse_error_with_path() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "library: [unterminated")?;
    let err = load(Some(&path), |_| None, &ConfigOverrides::default()).expect_err("bad yaml");
    match err {
        ConfigError::Parse { path: Some(p), .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}
