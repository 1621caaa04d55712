use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Missing parameter: ${0}")]
    MissingParameter(String),

    #[error("Key '{0}' not found in record")]
    KeyNotFound(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Record mapping failed: {0}")]
    Mapping(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Write statement rejected in read transaction: {0}")]
    ReadOnly(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Session {0} is closed")]
    SessionClosed(u64),

    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl DbError {
    /// Tag an error raised while turning a record into a domain value
    pub fn mapping(self) -> Self {
        match self {
            DbError::Mapping(_) => self,
            other => DbError::Mapping(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
