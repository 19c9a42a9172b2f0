//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("max_rounds must be between 1 and {max}, got {got}")]
    InvalidMaxRounds { got: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DomainError::InvalidMaxRounds { got: 12, max: 10 };
        assert_eq!(error.to_string(), "max_rounds must be between 1 and 10, got 12");
        assert_eq!(
            DomainError::UnknownParticipant("x".into()).to_string(),
            "Unknown participant: x"
        );
    }
}
