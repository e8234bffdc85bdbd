//! Validation helpers for configuration documents.

use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConcurrencyConfig, CuratorConfig, EvaluationConfig, LibraryConfig};

/// Validate a fully merged configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that fails validation.
pub fn validate(config: &CuratorConfig) -> ConfigResult<()> {
    validate_library(&config.library)?;
    validate_evaluation(&config.evaluation)?;
    validate_concurrency(config.concurrency)?;

    for pattern in &config.scan.exclude_patterns {
        if pattern.trim().is_empty() {
            return Err(ConfigError::invalid(
                "scan",
                "exclude_patterns",
                Some(pattern.clone()),
                "empty_pattern",
            ));
        }
    }

    if config.telemetry.log_level.trim().is_empty() {
        return Err(ConfigError::invalid("telemetry", "log_level", None, "empty"));
    }
    if let Some(format) = config.telemetry.log_format.as_deref()
        && !matches!(format, "json" | "pretty")
    {
        return Err(ConfigError::invalid(
            "telemetry",
            "log_format",
            Some(format.to_string()),
            "unknown_format",
        ));
    }

    if let Some(url) = config.notifier.webhook_url.as_deref()
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        return Err(ConfigError::invalid(
            "notifier",
            "webhook_url",
            Some(url.to_string()),
            "unsupported_scheme",
        ));
    }

    Ok(())
}

fn validate_library(library: &LibraryConfig) -> ConfigResult<()> {
    ensure_path("base_path", &library.base_path)?;
    ensure_path("destination_path", &library.destination_path)?;

    if library.destination_path == library.base_path {
        return Err(ConfigError::invalid(
            "library",
            "destination_path",
            Some(library.destination_path.display().to_string()),
            "same_as_base",
        ));
    }
    if library.destination_path.starts_with(&library.base_path) {
        return Err(ConfigError::invalid(
            "library",
            "destination_path",
            Some(library.destination_path.display().to_string()),
            "inside_base",
        ));
    }

    if library.accepted_file_types.is_empty() {
        return Err(ConfigError::invalid(
            "library",
            "accepted_file_types",
            None,
            "empty",
        ));
    }
    for extension in &library.accepted_file_types {
        if extension.is_empty() || extension.contains(|c: char| matches!(c, '.' | '/' | '\\')) {
            return Err(ConfigError::invalid(
                "library",
                "accepted_file_types",
                Some(extension.clone()),
                "invalid_extension",
            ));
        }
    }
    Ok(())
}

fn ensure_path(field: &'static str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid("library", field, None, "empty"));
    }
    Ok(())
}

fn validate_evaluation(evaluation: &EvaluationConfig) -> ConfigResult<()> {
    if evaluation.min_width == 0 {
        return Err(ConfigError::invalid("evaluation", "min_width", None, "zero"));
    }
    if evaluation.min_height == 0 {
        return Err(ConfigError::invalid("evaluation", "min_height", None, "zero"));
    }
    if evaluation.probe_binary.trim().is_empty() {
        return Err(ConfigError::invalid(
            "evaluation",
            "probe_binary",
            None,
            "empty",
        ));
    }
    if evaluation.probe_timeout_secs == 0 {
        return Err(ConfigError::invalid(
            "evaluation",
            "probe_timeout_secs",
            None,
            "zero",
        ));
    }
    Ok(())
}

fn validate_concurrency(concurrency: ConcurrencyConfig) -> ConfigResult<()> {
    let fields = [
        ("permission_checks", concurrency.permission_checks),
        ("evaluations", concurrency.evaluations),
        ("moves", concurrency.moves),
    ];
    for (field, value) in fields {
        if value == 0 {
            return Err(ConfigError::invalid("concurrency", field, None, "zero"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> CuratorConfig {
        let mut config = CuratorConfig::default();
        config.library.base_path = PathBuf::from("/media/incoming");
        config.library.destination_path = PathBuf::from("/media/uhd");
        config
    }

    fn reason_of(err: &ConfigError) -> (&'static str, &'static str, &'static str) {
        match err {
            ConfigError::InvalidField {
                section,
                field,
                reason,
                ..
            } => (*section, *field, *reason),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accepts_minimal_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn rejects_missing_paths() {
        let mut config = valid_config();
        config.library.base_path = PathBuf::new();
        let err = validate(&config).expect_err("empty base path");
        assert_eq!(reason_of(&err), ("library", "base_path", "empty"));
    }

    #[test]
    fn rejects_destination_inside_base() {
        let mut config = valid_config();
        config.library.destination_path = PathBuf::from("/media/incoming/uhd");
        let err = validate(&config).expect_err("nested destination");
        assert_eq!(
            reason_of(&err),
            ("library", "destination_path", "inside_base")
        );

        config.library.destination_path = config.library.base_path.clone();
        let err = validate(&config).expect_err("same destination");
        assert_eq!(
            reason_of(&err),
            ("library", "destination_path", "same_as_base")
        );
    }

    #[test]
    fn rejects_dotted_extensions() {
        let mut config = valid_config();
        config.library.accepted_file_types = vec![".mkv".into()];
        let err = validate(&config).expect_err("dotted extension");
        assert_eq!(
            reason_of(&err),
            ("library", "accepted_file_types", "invalid_extension")
        );
    }

    #[test]
    fn rejects_multi_part_extensions() {
        let mut config = valid_config();
        config.library.accepted_file_types = vec!["mkv".into(), "tar.gz".into()];
        let err = validate(&config).expect_err("multi-part extension");
        assert_eq!(
            reason_of(&err),
            ("library", "accepted_file_types", "invalid_extension")
        );
    }

    #[test]
    fn rejects_zero_concurrency_and_threshold() {
        let mut config = valid_config();
        config.concurrency.moves = 0;
        let err = validate(&config).expect_err("zero moves");
        assert_eq!(reason_of(&err), ("concurrency", "moves", "zero"));

        let mut config = valid_config();
        config.evaluation.min_height = 0;
        let err = validate(&config).expect_err("zero height");
        assert_eq!(reason_of(&err), ("evaluation", "min_height", "zero"));
    }

    #[test]
    fn rejects_unknown_log_format_and_webhook_scheme() {
        let mut config = valid_config();
        config.telemetry.log_format = Some("xml".into());
        let err = validate(&config).expect_err("bad format");
        assert_eq!(
            reason_of(&err),
            ("telemetry", "log_format", "unknown_format")
        );

        let mut config = valid_config();
        config.notifier.webhook_url = Some("ftp://hooks".into());
        let err = validate(&config).expect_err("bad scheme");
        assert_eq!(
            reason_of(&err),
            ("notifier", "webhook_url", "unsupported_scheme")
        );
    }
}
