//! Configuration validation.

use hive_protocols::MailboxKind;

use crate::schema::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::validate_kernel(config, &mut result);
        Self::validate_mailbox(config, &mut result);
        Self::validate_logging(config, &mut result);
        result
    }

    fn validate_kernel(config: &Config, result: &mut ValidationResult) {
        if config.kernel.name.trim().is_empty() {
            result.add_error(ValidationError::new("kernel.name", "Name cannot be empty"));
        }

        if config.kernel.shutdown_timeout_secs == 0 {
            result.add_warning(ValidationWarning::new(
                "kernel.shutdown_timeout_secs",
                "A zero timeout makes every stop hook time out",
            ));
        }

        if config.kernel.max_rounds == 0 && config.kernel.round_interval_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "kernel.round_interval_ms",
                "Unbounded rounds without a pause will spin while agents are alive",
            ));
        }
    }

    fn validate_mailbox(config: &Config, result: &mut ValidationResult) {
        if config.mailbox.kind == MailboxKind::BufferedPerSender {
            result.add_warning(ValidationWarning::new(
                "mailbox.kind",
                "buffered_per_sender keeps only the latest message of each sender \
                 per synchronization",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown level '{}', expected one of {}",
                    config.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }
    }
}
