use crate::domain::IdentifierKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Generation exhausted: no unused {kind} found after {attempts} attempts")]
    GenerationExhausted {
        kind: IdentifierKind,
        attempts: u32,
    },

    #[error("Invalid brand code: {0}")]
    InvalidBrandCode(String),

    #[error("Invalid OUI prefix: {0}")]
    InvalidOuiPrefix(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker failed: {0}")]
    Join(String),
}

impl Error {
    /// True when the keyspace could not supply an unused identifier
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Error::GenerationExhausted { .. })
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Join(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_exhausted_serial() {
        let err = Error::GenerationExhausted {
            kind: IdentifierKind::SerialNumber,
            attempts: 100,
        };
        assert_eq!(
            err.to_string(),
            "Generation exhausted: no unused serial number found after 100 attempts"
        );
    }

    #[test]
    fn test_error_display_exhausted_mac() {
        let err = Error::GenerationExhausted {
            kind: IdentifierKind::MacAddress,
            attempts: 10,
        };
        assert_eq!(
            err.to_string(),
            "Generation exhausted: no unused MAC address found after 10 attempts"
        );
    }

    #[test]
    fn test_error_display_invalid_brand_code() {
        let err = Error::InvalidBrandCode("AB1".to_string());
        assert_eq!(err.to_string(), "Invalid brand code: AB1");
    }

    #[test]
    fn test_error_display_invalid_oui_prefix() {
        let err = Error::InvalidOuiPrefix("zz".to_string());
        assert_eq!(err.to_string(), "Invalid OUI prefix: zz");
    }

    #[test]
    fn test_is_exhausted() {
        let err = Error::GenerationExhausted {
            kind: IdentifierKind::SerialNumber,
            attempts: 1,
        };
        assert!(err.is_exhausted());
        assert!(!Error::InvalidBrandCode(String::new()).is_exhausted());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_exhausted());
    }

    #[test]
    fn test_error_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
