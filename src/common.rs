//! Common types and error definitions for rsdir
//!
//! This module contains the error type shared by every codec and key type,
//! and the configuration carrying the externalizer type identifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default type identifier of the first key externalizer.
/// The remaining key kinds take the following consecutive ids.
pub const DEFAULT_BASE_EXTERNALIZER_ID: u32 = 1300;

/// Error types for rsdir operations
#[derive(Error, Debug)]
pub enum RsDirError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// A key was constructed with a missing mandatory field
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Truncated or inconsistent input stream
    #[error("Data corruption detected: {message}")]
    Corruption { message: String },

    /// Text too long for the 2-byte length prefix
    #[error("Encoded string length {length} exceeds maximum of 65535 bytes")]
    UtfDataFormat { length: usize },

    #[error("No externalizer registered for type id {id}")]
    UnknownExternalizer { id: u32 },

    #[error("Unexpected key mapping format: {key}")]
    KeyMapping { key: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl RsDirError {
    pub(crate) fn corruption(message: impl Into<String>) -> Self {
        RsDirError::Corruption {
            message: message.into(),
        }
    }

    /// Maps an I/O error raised while reading a field. A premature end of
    /// stream means the record is truncated, which is corruption rather than
    /// a device failure.
    pub(crate) fn from_read(err: std::io::Error, field: &str) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            RsDirError::corruption(format!("stream truncated while reading {field}"))
        } else {
            RsDirError::Io(err)
        }
    }

    /// Check if this error indicates data corruption
    pub fn is_corruption(&self) -> bool {
        matches!(self, RsDirError::Corruption { .. })
    }

    /// Check if this error is a user input error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RsDirError::InvalidArgument { .. }
                | RsDirError::UtfDataFormat { .. }
                | RsDirError::KeyMapping { .. }
                | RsDirError::InvalidConfig { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            RsDirError::Io(_) => "io",
            RsDirError::InvalidArgument { .. } => "invalid_argument",
            RsDirError::Corruption { .. } => "corruption",
            RsDirError::UtfDataFormat { .. } => "utf_format",
            RsDirError::UnknownExternalizer { .. } => "unknown_externalizer",
            RsDirError::KeyMapping { .. } => "key_mapping",
            RsDirError::InvalidConfig { .. } => "configuration",
        }
    }
}

/// Result type alias for rsdir operations
pub type Result<T> = std::result::Result<T, RsDirError>;

/// Configuration for the externalizer table.
///
/// The identifiers are assigned by the hosting marshaller's registry and must
/// stay stable across releases: they are written in front of every tagged key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub file_cache_key_id: u32,
    pub chunk_cache_key_id: u32,
    pub file_list_cache_key_id: u32,
    pub file_read_lock_key_id: u32,
}

impl Config {
    /// Assign consecutive ids starting at `base`.
    pub fn with_base_id(base: u32) -> Result<Self> {
        let last = base.checked_add(3).ok_or_else(|| RsDirError::InvalidConfig {
            message: format!("Base id {base} leaves no room for four externalizers"),
        })?;
        let config = Self {
            file_cache_key_id: base,
            chunk_cache_key_id: base + 1,
            file_list_cache_key_id: base + 2,
            file_read_lock_key_id: last,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        let ids = [
            ("file_cache_key_id", self.file_cache_key_id),
            ("chunk_cache_key_id", self.chunk_cache_key_id),
            ("file_list_cache_key_id", self.file_list_cache_key_id),
            ("file_read_lock_key_id", self.file_read_lock_key_id),
        ];
        for (i, (name, id)) in ids.iter().enumerate() {
            if let Some((other, _)) = ids[i + 1..].iter().find(|(_, o)| o == id) {
                return Err(RsDirError::InvalidConfig {
                    message: format!("{name} and {other} share externalizer id {id}"),
                });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_cache_key_id: DEFAULT_BASE_EXTERNALIZER_ID,
            chunk_cache_key_id: DEFAULT_BASE_EXTERNALIZER_ID + 1,
            file_list_cache_key_id: DEFAULT_BASE_EXTERNALIZER_ID + 2,
            file_read_lock_key_id: DEFAULT_BASE_EXTERNALIZER_ID + 3,
        }
    }
}
