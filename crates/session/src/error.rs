use thiserror::Error;

/// Failure talking to the backing platform or the session store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("session store error: {0}")]
    Store(String),
}

impl SessionError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
