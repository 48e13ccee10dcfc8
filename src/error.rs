use std::fmt::{Display, Formatter};

use crate::local::LocalStorageError;
use crate::store::StoreError;

/// Failure classes of the like/favorite services.
///
/// None of these reach callers of the public operations: they are logged and mapped to
/// the operation's safe default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InterestErrorCode {
    /// Empty user or location identifier.
    InvalidInput,
    /// The remote document store failed.
    RemoteUnavailable,
    /// Device-local persistence failed.
    LocalUnavailable,
    /// A stored value had an unexpected shape.
    MalformedState,
}

impl InterestErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestErrorCode::InvalidInput => "interest/invalid-input",
            InterestErrorCode::RemoteUnavailable => "interest/remote-unavailable",
            InterestErrorCode::LocalUnavailable => "interest/local-unavailable",
            InterestErrorCode::MalformedState => "interest/malformed-state",
        }
    }
}

#[derive(Clone, Debug)]
pub struct InterestError {
    pub code: InterestErrorCode,
    message: String,
}

impl InterestError {
    pub fn new(code: InterestErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for InterestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for InterestError {}

impl From<StoreError> for InterestError {
    fn from(err: StoreError) -> Self {
        remote_unavailable(err.to_string())
    }
}

impl From<LocalStorageError> for InterestError {
    fn from(err: LocalStorageError) -> Self {
        local_unavailable(err.to_string())
    }
}

pub type InterestResult<T> = Result<T, InterestError>;

pub fn invalid_input(message: impl Into<String>) -> InterestError {
    InterestError::new(InterestErrorCode::InvalidInput, message)
}

pub fn remote_unavailable(message: impl Into<String>) -> InterestError {
    InterestError::new(InterestErrorCode::RemoteUnavailable, message)
}

pub fn local_unavailable(message: impl Into<String>) -> InterestError {
    InterestError::new(InterestErrorCode::LocalUnavailable, message)
}

pub fn malformed_state(message: impl Into<String>) -> InterestError {
    InterestError::new(InterestErrorCode::MalformedState, message)
}

/// Rejects empty identifiers before any store is touched.
pub(crate) fn require_id(label: &str, value: &str) -> InterestResult<()> {
    if value.is_empty() {
        Err(invalid_input(format!("{label} must not be empty")))
    } else {
        Ok(())
    }
}

/// Logs `err` at the level matching its class and returns `fallback`.
pub(crate) fn recover<T>(operation: &str, err: InterestError, fallback: T) -> T {
    match err.code {
        InterestErrorCode::RemoteUnavailable | InterestErrorCode::LocalUnavailable => {
            log::warn!("{operation} failed: {err}");
        }
        InterestErrorCode::InvalidInput | InterestErrorCode::MalformedState => {
            log::debug!("{operation} skipped: {err}");
        }
    }
    fallback
}
