use std::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerErrorType {
    InvalidName,
    AlreadyExists,
    InvalidPath,
    NotFound,
    IOError,
    SerializationError,
    InternalError,
}

#[derive(Debug)]
pub struct ExplorerError {
    pub error_type: ExplorerErrorType,
    pub message: String,
}

impl ExplorerError {
    pub fn new(error_type: ExplorerErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
        }
    }

    pub fn invalid_name(name: &str) -> Self {
        Self::new(
            ExplorerErrorType::InvalidName,
            format!("`{}` is not a valid item name", name),
        )
    }

    pub fn already_exists(path: &str) -> Self {
        Self::new(
            ExplorerErrorType::AlreadyExists,
            format!("Something already exists at {}", path),
        )
    }

    pub fn kind(&self) -> ExplorerErrorType {
        self.error_type
    }
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.error_type, self.message)
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(error: std::io::Error) -> Self {
        Self {
            error_type: ExplorerErrorType::IOError,
            message: error.to_string(),
        }
    }
}

impl From<sled::Error> for ExplorerError {
    fn from(error: sled::Error) -> Self {
        Self {
            error_type: ExplorerErrorType::IOError,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(error: serde_json::Error) -> Self {
        Self {
            error_type: ExplorerErrorType::SerializationError,
            message: error.to_string(),
        }
    }
}

impl<T: std::fmt::Debug> From<ciborium::de::Error<T>> for ExplorerError {
    fn from(error: ciborium::de::Error<T>) -> Self {
        Self {
            error_type: ExplorerErrorType::SerializationError,
            message: format!("Failed to decode stored tree: {:?}", error),
        }
    }
}

impl<T: std::fmt::Debug> From<ciborium::ser::Error<T>> for ExplorerError {
    fn from(error: ciborium::ser::Error<T>) -> Self {
        Self {
            error_type: ExplorerErrorType::SerializationError,
            message: format!("Failed to encode tree: {:?}", error),
        }
    }
}

impl Error for ExplorerError {}

pub type Result<T> = std::result::Result<T, ExplorerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = ExplorerError::already_exists("/src/main.rs");
        assert_eq!(
            err.to_string(),
            "AlreadyExists: Something already exists at /src/main.rs"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ExplorerError = io.into();
        assert_eq!(err.kind(), ExplorerErrorType::IOError);
    }
}
