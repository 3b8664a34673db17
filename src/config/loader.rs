//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::PushConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for push configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The file is not valid TOML for [`PushConfig`].
    Parse(toml::de::Error),
    /// The config parsed but describes an unusable push setup.
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "cannot read push config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid push config TOML: {}", e),
            ConfigError::Validation(errors) => {
                let count = errors.len();
                write!(
                    f,
                    "push config has {} problem{}: ",
                    count,
                    if count == 1 { "" } else { "s" }
                )?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<PushConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<PushConfig, ConfigError> {
    let config: PushConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DEFAULT_COOKIE_NAME;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.cookie.name, DEFAULT_COOKIE_NAME);
        assert_eq!(config.cookie.max_age_secs, 7_776_000);
        assert!(config.cookie.secure);
        assert!(config.cookie.http_only);
        assert!(config.redirects.enabled);
        assert!(config.pushed_header.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            pushed_header = "X-H2-Pushed"

            [memory]
            expected_resources = 64
            false_positive_rate = 0.001

            [cookie]
            name = "push-memory"
            max_age_secs = 3600
            http_only = false

            [push_headers]
            "X-Push-Origin" = "edge"

            [redirects]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.memory.expected_resources, 64);
        assert_eq!(config.cookie.name, "push-memory");
        assert_eq!(config.cookie.max_age_secs, 3600);
        assert!(!config.cookie.http_only);
        assert!(config.cookie.secure);
        assert_eq!(config.push_headers["X-Push-Origin"], "edge");
        assert_eq!(config.pushed_header.as_deref(), Some("X-H2-Pushed"));
        assert!(!config.redirects.enabled);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = parse_config("[memory]\nfalse_positive_rate = 0.0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::FalsePositiveRate(0.0)]);
            }
            other => panic!("expected validation error, got {other}"),
        }

        assert!(matches!(
            parse_config("memory = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = parse_config(
            "[memory]\nfalse_positive_rate = 0.0\n[cookie]\nmax_age_secs = 0\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "push config has 2 problems: \
             memory.false_positive_rate must be in (0, 1), got 0; \
             cookie.max_age_secs must be greater than zero"
        );

        let err = parse_config("memory = 3").unwrap_err();
        assert!(err.to_string().starts_with("invalid push config TOML: "));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
