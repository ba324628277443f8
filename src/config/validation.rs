//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{AdapterKind, Config};
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("sweeper.interval_secs must be greater than zero")]
    ZeroSweepInterval,
    #[error("adapter.timeout_secs must be greater than zero")]
    ZeroAdapterTimeout,
    #[error("adapter.url is required for the webhook adapter")]
    MissingWebhookUrl,
    #[error("adapter.url must be an http(s) URL, got '{0}'")]
    InvalidWebhookUrl(String),
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sweeper.enabled && config.sweeper.interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }

    if config.adapter.timeout_secs == 0 {
        errors.push(ValidationError::ZeroAdapterTimeout);
    }

    if config.adapter.kind == AdapterKind::Webhook {
        match config.adapter.url.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingWebhookUrl),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                errors.push(ValidationError::InvalidWebhookUrl(url.to_string()));
            }
            Some(_) => {}
        }
    }

    if let Some(ref db) = config.database
        && db.path != ":memory:"
    {
        let db_path = Path::new(&db.path);
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::DatabasePathInvalid(db.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_webhook_without_url_fails() {
        let config: Config = toml::from_str("[adapter]\nkind = \"webhook\"\n").unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingWebhookUrl)));
    }

    #[test]
    fn test_webhook_with_bad_scheme_fails() {
        let config: Config =
            toml::from_str("[adapter]\nkind = \"webhook\"\nurl = \"ftp://bridge\"\n").unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidWebhookUrl(_))));
    }

    #[test]
    fn test_all_errors_are_collected() {
        let toml = r#"
[database]
path = "/nonexistent/dir/restrictd.db"

[sweeper]
interval_secs = 0

[adapter]
timeout_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_zero_interval_allowed_when_sweeper_disabled() {
        let config: Config =
            toml::from_str("[sweeper]\nenabled = false\ninterval_secs = 0\n").unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_memory_database_passes() {
        let config: Config = toml::from_str("[database]\npath = \":memory:\"\n").unwrap();
        assert!(validate(&config).is_ok());
    }
}
