use thiserror::Error;

use crate::entities::DispatchStatus;

#[derive(Error, Debug, Clone)]
pub enum DispatchError {
    #[error("database operation failed: {0}")]
    Database(String),
    #[error("dispatch not found: id={id}")]
    DispatchNotFound { id: i64 },
    #[error("user not found: id={id}")]
    UserNotFound { id: i64 },
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("cannot {action} a dispatch in status {from}")]
    InvalidTransition {
        from: DispatchStatus,
        action: &'static str,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    pub fn dispatch_not_found(id: i64) -> Self {
        Self::DispatchNotFound { id }
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn invalid_transition(from: DispatchStatus, action: &'static str) -> Self {
        Self::InvalidTransition { from, action }
    }

    pub fn validation_error<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        DispatchError::Database(err.to_string())
    }
}
