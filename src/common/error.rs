//! Error types for lateral_planner
//!
//! Planning cycles never fail: numerical and input problems are recovered
//! inside the cycle. Only configuration loading returns these errors.

use thiserror::Error;

/// Main error type for the lateral planner
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Configuration file could not be read
    #[error("config read error: {0}")]
    ConfigRead(#[from] std::io::Error),
    /// Configuration file is not valid TOML or has wrong field types
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    /// Invalid parameter
    #[error("invalid parameter '{field}': {message}")]
    InvalidParameter { field: String, message: String },
}

impl PlannerError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        PlannerError::InvalidParameter {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::invalid("hysteresis.enter_laneline", "must be in [0, 1]");
        assert_eq!(
            format!("{}", err),
            "invalid parameter 'hysteresis.enter_laneline': must be in [0, 1]"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::ConfigRead(_)));
    }
}
