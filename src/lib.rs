//! # rsdir: cache keys for a distributed index directory
//!
//! `rsdir` defines the keys under which an index directory stores its files
//! in a distributed cache, and the binary codec used when those keys cross a
//! storage or network boundary.
//!
//! ## Core Features
//!
//! - **Index-scoped keys**: immutable [`FileCacheKey`], [`ChunkCacheKey`],
//!   [`FileListCacheKey`] and [`FileReadLockKey`], with a cached hash and an
//!   affinity segment id that never affects identity
//! - **Stable wire format**: length-prefixed modified UTF-8 strings and
//!   unsigned varints, byte-compatible with JVM writers
//! - **Visitor dispatch**: [`KeyVisitor`] gives callers per-variant behaviour
//!   without inspecting types
//! - **Externalizer table**: tagged encode/decode of any key under ids
//!   supplied by the host registry
//!
//! ## Example
//!
//! ```rust
//! use rsdir::{Config, ExternalizerTable, FileCacheKey, IndexScopedKey};
//!
//! fn main() -> rsdir::Result<()> {
//!     let table = ExternalizerTable::new(&Config::default())?;
//!
//!     let key = FileCacheKey::new("products", "segments_1", 3);
//!     assert_eq!(key.to_string(), "M|segments_1|products|3");
//!
//!     let bytes = table.encode(&IndexScopedKey::from(key.clone()))?;
//!     assert_eq!(table.decode(&bytes)?, IndexScopedKey::File(key));
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod externalizer;
pub mod keys;
pub mod mapper;
pub mod utf;
pub mod varint;

// Re-export commonly used types
pub use common::{Config, Result, RsDirError};
pub use externalizer::{
    ChunkCacheKeyExternalizer, Externalizer, ExternalizerTable, FileCacheKeyExternalizer,
    FileListCacheKeyExternalizer, FileReadLockKeyExternalizer,
};
pub use keys::{
    ChunkCacheKey, FileCacheKey, FileListCacheKey, FileReadLockKey, IndexScoped, IndexScopedKey,
    KeyKind, KeyVisitor,
};
pub use mapper::KeyMapper;
