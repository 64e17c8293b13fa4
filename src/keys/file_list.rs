use std::fmt;
use std::hash::{Hash, Hasher};

use super::{HASH_PRIME, IndexScoped, KeyVisitor, java_string_hash};

/// Key of the entry listing all files of an index. One per index.
#[derive(Debug, Clone)]
pub struct FileListCacheKey {
    index_name: String,
    affinity_segment_id: u32,
    hash_code: i32,
}

impl FileListCacheKey {
    pub fn new(index_name: impl Into<String>, affinity_segment_id: u32) -> Self {
        let index_name = index_name.into();
        let hash_code = HASH_PRIME.wrapping_add(java_string_hash(&index_name));
        Self {
            index_name,
            affinity_segment_id,
            hash_code,
        }
    }

    pub fn hash_code(&self) -> i32 {
        self.hash_code
    }
}

impl IndexScoped for FileListCacheKey {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn affinity_segment_id(&self) -> u32 {
        self.affinity_segment_id
    }

    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_file_list(self)
    }
}

impl PartialEq for FileListCacheKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.index_name == other.index_name
    }
}

impl Eq for FileListCacheKey {}

impl Hash for FileListCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code);
    }
}

/// `*|<index>|<affinity>`
impl fmt::Display for FileListCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*|{}|{}", self.index_name, self.affinity_segment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_form() {
        let key = FileListCacheKey::new("idx", 7);
        assert_eq!(key.to_string(), "*|idx|7");
    }

    #[test]
    fn test_affinity_is_not_identity() {
        let a = FileListCacheKey::new("idx", 7);
        let b = FileListCacheKey::new("idx", 8);
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, FileListCacheKey::new("other", 7));
    }
}
