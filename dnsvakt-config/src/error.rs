//! Error types for settings loading and validation.

use thiserror::Error;
use validator::ValidationErrors;

use crate::SETTINGS_FILE;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `--help` was requested. Carries the rendered usage text.
    #[error("{0}")]
    Help(String),

    #[error("invalid command line: {0}")]
    Cli(String),

    #[error("failed to read {SETTINGS_FILE}: {0}")]
    FileRead(String),

    #[error("{SETTINGS_FILE} is not valid JSON: {0}")]
    FileParse(String),

    #[error("option '{0}' has the wrong type")]
    WrongType(&'static str),

    #[error("required option '{0}' is missing")]
    MissingOption(&'static str),

    #[error("invalid settings:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.field_errors() {
        let _ = writeln!(output, "Field '{}':", field);
        for error in errors.iter() {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => error.code.to_string(),
            };
            let _ = writeln!(output, "  - {}", message);
        }
    }
    output
}
