//! Reader configuration
//!
//! Configuration is plain data with serde support so hosts can keep it next to
//! their own settings:
//!
//! ```toml
//! max_symlink_hops = 40
//! verify_headers = true
//! require_terminator = false
//! ```

use crate::error::{Result, UstarError};
use serde::{Deserialize, Serialize};

/// Symlink hops followed before resolution gives up
pub const DEFAULT_MAX_SYMLINK_HOPS: usize = 40;

/// Tunables for [`ArchiveReader`](crate::ArchiveReader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum number of symlinks followed while resolving one path
    pub max_symlink_hops: usize,

    /// Validate magic, version and checksum of every header a query visits
    pub verify_headers: bool,

    /// Treat a stream that ends without an all-zero block as truncated
    pub require_terminator: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_symlink_hops: DEFAULT_MAX_SYMLINK_HOPS,
            verify_headers: true,
            require_terminator: false,
        }
    }
}

impl ReaderConfig {
    /// Parse from TOML and validate
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_symlink_hops == 0 {
            return Err(UstarError::InvalidConfig(
                "max_symlink_hops must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.max_symlink_hops, 40);
        assert!(config.verify_headers);
        assert!(!config.require_terminator);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ReaderConfig::from_toml("max_symlink_hops = 8").unwrap();
        assert_eq!(config.max_symlink_hops, 8);
        assert!(config.verify_headers);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ReaderConfig {
            max_symlink_hops: 3,
            verify_headers: false,
            require_terminator: true,
        };
        let text = config.to_toml().unwrap();
        assert_eq!(ReaderConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_zero_hops_rejected() {
        let result = ReaderConfig::from_toml("max_symlink_hops = 0");
        assert!(matches!(result, Err(UstarError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = ReaderConfig::from_toml("max_symlink_hops = \"many\"");
        assert!(matches!(result, Err(UstarError::TomlError(_))));
    }
}
