use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalStorageErrorCode {
    InvalidArgument,
    Io,
    Internal,
}

impl LocalStorageErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalStorageErrorCode::InvalidArgument => "local-storage/invalid-argument",
            LocalStorageErrorCode::Io => "local-storage/io",
            LocalStorageErrorCode::Internal => "local-storage/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct LocalStorageError {
    pub code: LocalStorageErrorCode,
    message: String,
}

impl LocalStorageError {
    pub fn new(code: LocalStorageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for LocalStorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for LocalStorageError {}

pub type LocalStorageResult<T> = Result<T, LocalStorageError>;

pub fn invalid_argument(message: impl Into<String>) -> LocalStorageError {
    LocalStorageError::new(LocalStorageErrorCode::InvalidArgument, message)
}

pub fn io_error(message: impl Into<String>) -> LocalStorageError {
    LocalStorageError::new(LocalStorageErrorCode::Io, message)
}

pub fn internal_error(message: impl Into<String>) -> LocalStorageError {
    LocalStorageError::new(LocalStorageErrorCode::Internal, message)
}
