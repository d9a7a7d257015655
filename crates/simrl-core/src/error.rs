//! Error types for SimRL

use thiserror::Error;

/// Main error type for SimRL
#[derive(Error, Debug)]
pub enum SimError {
    /// A value of the wrong kind was supplied (string where an integer was
    /// expected, integer literal where a float was expected, ...).
    #[error("Type error: {0}")]
    Type(String),

    /// A value of the right kind but outside its permitted range.
    #[error("Value error: {0}")]
    Value(String),

    #[error("Too many controllable variables: {count} (at most {max} are supported)")]
    TooManyVariables { count: usize, max: usize },

    #[error("State space too large: more than {max} states")]
    SpaceTooLarge { max: usize },

    /// Operation invoked in the wrong engine phase.
    #[error("Phase error: {0}")]
    Phase(String),

    #[error("Plant error: {0}")]
    Plant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn is_type_error(&self) -> bool {
        matches!(self, SimError::Type(_))
    }

    pub fn is_value_error(&self) -> bool {
        matches!(self, SimError::Value(_))
    }
}

/// Result type alias for SimRL operations
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(SimError::Type("x".into()).is_type_error());
        assert!(!SimError::Type("x".into()).is_value_error());
        assert!(SimError::Value("x".into()).is_value_error());
        assert!(!SimError::Plant("x".into()).is_type_error());
    }

    #[test]
    fn test_too_many_variables_message() {
        let err = SimError::TooManyVariables { count: 5, max: 4 };
        assert_eq!(
            err.to_string(),
            "Too many controllable variables: 5 (at most 4 are supported)"
        );
    }

    #[test]
    fn test_space_too_large_message() {
        let err = SimError::SpaceTooLarge { max: 1_000_000 };
        assert_eq!(
            err.to_string(),
            "State space too large: more than 1000000 states"
        );
        assert!(!err.is_value_error());
    }
}
