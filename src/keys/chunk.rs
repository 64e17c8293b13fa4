use std::fmt;
use std::hash::{Hash, Hasher};

use super::{HASH_PRIME, IndexScoped, KeyVisitor, java_string_hash};
use crate::common::{Result, RsDirError};

/// Key of one fixed-size chunk of a file's content.
///
/// The buffer size is part of the identity: the same file chunked with a
/// different buffer size yields different chunks.
#[derive(Debug, Clone)]
pub struct ChunkCacheKey {
    index_name: String,
    file_name: String,
    chunk_id: u32,
    buffer_size: u32,
    affinity_segment_id: u32,
    hash_code: i32,
}

impl ChunkCacheKey {
    pub fn new(
        index_name: impl Into<String>,
        file_name: impl Into<String>,
        chunk_id: u32,
        buffer_size: u32,
        affinity_segment_id: u32,
    ) -> Self {
        let index_name = index_name.into();
        let file_name = file_name.into();

        let mut hash_code = HASH_PRIME.wrapping_add(java_string_hash(&file_name));
        for part in [chunk_id as i32, buffer_size as i32, java_string_hash(&index_name)] {
            hash_code = HASH_PRIME.wrapping_mul(hash_code).wrapping_add(part);
        }

        Self {
            index_name,
            file_name,
            chunk_id,
            buffer_size,
            affinity_segment_id,
            hash_code,
        }
    }

    pub fn try_new<I, F>(
        index_name: I,
        file_name: Option<F>,
        chunk_id: u32,
        buffer_size: u32,
        affinity_segment_id: u32,
    ) -> Result<Self>
    where
        I: Into<String>,
        F: Into<String>,
    {
        let file_name = file_name.ok_or_else(|| RsDirError::InvalidArgument {
            message: "filename must not be null".to_string(),
        })?;
        Ok(Self::new(
            index_name,
            file_name,
            chunk_id,
            buffer_size,
            affinity_segment_id,
        ))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn chunk_id(&self) -> u32 {
        self.chunk_id
    }

    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    pub fn hash_code(&self) -> i32 {
        self.hash_code
    }
}

impl IndexScoped for ChunkCacheKey {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn affinity_segment_id(&self) -> u32 {
        self.affinity_segment_id
    }

    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> std::result::Result<V::Output, V::Error> {
        visitor.visit_chunk(self)
    }
}

impl PartialEq for ChunkCacheKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.chunk_id == other.chunk_id
                && self.buffer_size == other.buffer_size
                && self.file_name == other.file_name
                && self.index_name == other.index_name)
    }
}

impl Eq for ChunkCacheKey {}

impl Hash for ChunkCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code);
    }
}

/// `C|<file>|<chunk>|<buffer size>|<index>|<affinity>`
impl fmt::Display for ChunkCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C|{}|{}|{}|{}|{}",
            self.file_name,
            self.chunk_id,
            self.buffer_size,
            self.index_name,
            self.affinity_segment_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_size_is_identity() {
        let a = ChunkCacheKey::new("idx", "_0.cfs", 2, 16_384, 1);
        let b = ChunkCacheKey::new("idx", "_0.cfs", 2, 32_768, 1);
        let c = ChunkCacheKey::new("idx", "_0.cfs", 2, 16_384, 9);
        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.hash_code(), c.hash_code());
    }

    #[test]
    fn test_textual_form() {
        let key = ChunkCacheKey::new("idx", "_0.cfs", 2, 1024, 5);
        assert_eq!(key.to_string(), "C|_0.cfs|2|1024|idx|5");
    }

    #[test]
    fn test_try_new_requires_file_name() {
        let err = ChunkCacheKey::try_new("idx", None::<String>, 0, 1024, 0).unwrap_err();
        assert!(matches!(err, RsDirError::InvalidArgument { .. }));

        let key = ChunkCacheKey::try_new("idx", Some("_0.cfs"), 0, 1024, 0).unwrap();
        assert_eq!(key.buffer_size(), 1024);
    }
}
