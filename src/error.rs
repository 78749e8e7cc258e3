//! Error types for sqlport.

use thiserror::Error;

use crate::fix::FixStatus;

/// The main error type for sqlport operations.
///
/// Heuristic misses are never errors: an unknown dialect pair, malformed SQL or
/// an unreachable advisor all degrade to a well-defined result instead.
#[derive(Debug, Error)]
pub enum SqlportError {
    /// Dialect id outside the supported set.
    #[error("Unknown dialect: '{0}'. Expected one of: mysql, postgresql, oracle, sql_server, mongodb, redis, cassandra")]
    UnknownDialect(String),

    /// Fix category name that does not exist.
    #[error("Unknown fix category: '{0}'")]
    UnknownCategory(String),

    /// A built-in or configured detection pattern failed to compile.
    #[error("Invalid pattern for rule '{rule}': {message}")]
    Pattern { rule: String, message: String },

    /// Lifecycle transition out of a terminal state.
    #[error("Fix {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: FixStatus,
        to: FixStatus,
    },

    /// No fix with the given id in the current result.
    #[error("No fix with id '{0}'")]
    UnknownFix(String),

    /// Input exceeds the configured scan limit.
    #[error("Input too large: {size} bytes (limit {limit})")]
    InputTooLarge { size: usize, limit: usize },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Advisor failure. Only surfaces from advisor implementations; `consult`
    /// converts it into the fallback report.
    #[error("Advisor error: {0}")]
    Advisor(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlportError {
    /// Create a pattern compilation error for the given rule.
    pub fn pattern(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pattern {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Create an invalid transition error.
    pub fn transition(id: impl Into<String>, from: FixStatus, to: FixStatus) -> Self {
        Self::InvalidTransition {
            id: id.into(),
            from,
            to,
        }
    }
}

/// Result type alias for sqlport operations.
pub type SqlportResult<T> = Result<T, SqlportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqlportError::transition("syntax-001", FixStatus::Applied, FixStatus::Skipped);
        assert_eq!(
            err.to_string(),
            "Fix syntax-001 cannot move from applied to skipped"
        );
    }

    #[test]
    fn test_input_too_large_display() {
        let err = SqlportError::InputTooLarge { size: 10, limit: 4 };
        assert_eq!(err.to_string(), "Input too large: 10 bytes (limit 4)");
    }
}
