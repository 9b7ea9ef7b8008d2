use intrinsic_core::{CoreError, ValidationError, ValuationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Valuation(#[from] ValuationError),

    #[error("strict mode failed: {failed} of {total} tickers could not be valued")]
    StrictModeViolation { failed: usize, total: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Output(#[from] std::io::Error),
}

impl From<CoreError> for CliError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::Validation(error) => Self::Validation(error),
            CoreError::Serialization(error) => Self::Serialization(error),
            CoreError::Io { path, source } => Self::Io { path, source },
        }
    }
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Valuation(_) => 2,
            Self::StrictModeViolation { .. } => 3,
            Self::Serialization(_) => 4,
            Self::Io { .. } => 10,
            Self::Output(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let io = CliError::from(CoreError::Io {
            path: String::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        assert_eq!(io.exit_code(), 10);
        assert_eq!(io.to_string(), "failed to read missing.json: gone");

        let validation = CliError::from(CoreError::Validation(ValidationError::ZeroHorizon));
        assert_eq!(validation.exit_code(), 2);
    }

    #[test]
    fn strict_mode_exit_code() {
        let error = CliError::StrictModeViolation { failed: 1, total: 9 };
        assert_eq!(error.exit_code(), 3);
    }
}
