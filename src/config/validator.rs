use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{Result, SyncError, ValidationError};
use crate::filtering::Filter;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every failure
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_aws(config, &mut errors);
        Self::validate_consul(config, &mut errors);
        Self::validate_sync(config, &mut errors);
        Self::validate_registration(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SyncError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_aws(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.aws.region.trim().is_empty() {
            errors.push(ValidationError::new("aws.region", "Region cannot be empty"));
        }
    }

    fn validate_consul(config: &Config, errors: &mut Vec<ValidationError>) {
        let address = &config.consul.address;
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            errors.push(ValidationError::new(
                "consul.address",
                format!("Address must be an http(s) URL, got '{}'", address),
            ));
        }
    }

    fn validate_sync(config: &Config, errors: &mut Vec<ValidationError>) {
        match config.sync.interval() {
            Some(interval) if !interval.is_zero() => {}
            _ => errors.push(ValidationError::new(
                "sync.interval",
                format!("Invalid duration format: {}", config.sync.interval),
            )),
        }

        // Malformed expressions only warn: at match time they simply never match
        for invalid in Self::invalid_filters(config) {
            tracing::warn!(
                path = %invalid.path,
                error = %invalid.message,
                "Filter will never match"
            );
        }
    }

    /// Every configured filter expression that would never match, with its config path
    pub fn invalid_filters(config: &Config) -> Vec<ValidationError> {
        Self::filter_expressions(config)
            .filter_map(|(path, expression)| {
                Filter::parse(expression)
                    .and_then(|f| f.compile())
                    .err()
                    .map(|e| ValidationError::new(path, e.to_string()))
            })
            .collect()
    }

    fn filter_expressions(config: &Config) -> impl Iterator<Item = (&'static str, &String)> {
        config
            .sync
            .filters
            .iter()
            .map(|e| ("sync.filters", e))
            .chain(config.sync.exclusions.iter().map(|e| ("sync.exclusions", e)))
    }

    fn validate_registration(config: &Config, errors: &mut Vec<ValidationError>) {
        if config.registration.port == 0 {
            errors.push(ValidationError::new(
                "registration.port",
                "Port must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_errors(config: &Config) -> Vec<ValidationError> {
        match ConfigValidator::validate(config) {
            Err(SyncError::ConfigValidation { errors }) => errors,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_interval() {
        let mut config = Config::default();
        config.sync.interval = "often".to_string();
        let errors = validation_errors(&config);
        assert_eq!(errors[0].path, "sync.interval");

        config.sync.interval = "0s".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_malformed_filters_reported() {
        let mut config = Config::default();
        config.sync.filters = vec![
            "Name=tag:env,Values=dev".to_string(),
            "env=dev".to_string(),
        ];
        config.sync.exclusions = vec!["Name=tag:env,Values=(dev".to_string()];

        // Not fatal
        assert!(ConfigValidator::validate(&config).is_ok());

        let invalid = ConfigValidator::invalid_filters(&config);
        let paths: Vec<&str> = invalid.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["sync.filters", "sync.exclusions"]);
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = Config::default();
        config.aws.region = String::new();
        config.consul.address = "consul:8500".to_string();
        config.registration.port = 0;

        assert_eq!(validation_errors(&config).len(), 3);
    }
}
