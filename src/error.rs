use std::io;
use thiserror::Error;

/// Result type for ustar operations
pub type Result<T> = std::result::Result<T, UstarError>;

/// Unified error type for all ustar operations
#[derive(Debug, Error)]
pub enum UstarError {
    // Structural validation errors
    #[error("Invalid ustar magic: found {found}")]
    BadMagic { found: String },

    #[error("Invalid ustar version: found {found}")]
    BadVersion { found: String },

    #[error("Header checksum mismatch: stored {expected}, computed {actual}")]
    BadChecksum { expected: u32, actual: u32 },

    #[error("Value does not fit header field: {0}")]
    FieldOverflow(String),

    // Lookup errors
    #[error("No regular file at path: {0}")]
    NotFoundOrNotRegularFile(String),

    #[error("Offset {offset} is outside file of {size} bytes")]
    OffsetOutOfRange { offset: u64, size: u64 },

    #[error("Symlink resolution did not terminate at: {0}")]
    SymlinkCycle(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("TOML error: {0}")]
    TomlError(String),
}

impl UstarError {
    /// Build a `BadMagic` error from the raw magic field
    pub fn bad_magic(raw: &[u8]) -> Self {
        UstarError::BadMagic {
            found: hex::encode(raw),
        }
    }

    /// Build a `BadVersion` error from the raw version field
    pub fn bad_version(raw: &[u8]) -> Self {
        UstarError::BadVersion {
            found: hex::encode(raw),
        }
    }

    /// True for the structural kinds reported by archive validation
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            UstarError::BadMagic { .. }
                | UstarError::BadVersion { .. }
                | UstarError::BadChecksum { .. }
        )
    }
}

impl From<toml::de::Error> for UstarError {
    fn from(err: toml::de::Error) -> Self {
        UstarError::TomlError(err.to_string())
    }
}

impl From<toml::ser::Error> for UstarError {
    fn from(err: toml::ser::Error) -> Self {
        UstarError::TomlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_renders_hex() {
        let err = UstarError::bad_magic(b"ustaR\0");
        assert_eq!(err.to_string(), "Invalid ustar magic: found 757374615200");
        assert!(err.is_format_error());
    }

    #[test]
    fn test_io_is_not_format_error() {
        let err = UstarError::from(io::Error::from(io::ErrorKind::UnexpectedEof));
        assert!(!err.is_format_error());
        assert!(matches!(err, UstarError::Io(_)));
    }
}
