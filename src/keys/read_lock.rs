use std::fmt;
use std::hash::{Hash, Hasher};

use super::{IndexScoped, KeyVisitor, file_scoped_hash};
use crate::common::{Result, RsDirError};

/// Key of the read-lock counter guarding a file against deletion while
/// readers still hold it open.
///
/// Shares its fields with [`FileCacheKey`](super::FileCacheKey) but is a
/// distinct key: the two never compare equal.
#[derive(Debug, Clone)]
pub struct FileReadLockKey {
    index_name: String,
    file_name: String,
    affinity_segment_id: u32,
    hash_code: i32,
}

impl FileReadLockKey {
    pub fn new(
        index_name: impl Into<String>,
        file_name: impl Into<String>,
        affinity_segment_id: u32,
    ) -> Self {
        let index_name = index_name.into();
        let file_name = file_name.into();
        let hash_code = file_scoped_hash(&file_name, &index_name);
        Self {
            index_name,
            file_name,
            affinity_segment_id,
            hash_code,
        }
    }

    pub fn try_new<I, F>(
        index_name: I,
        file_name: Option<F>,
        affinity_segment_id: u32,
    ) -> Result<Self>
    where
        I: Into<String>,
        F: Into<String>,
    {
        let file_name = file_name.ok_or_else(|| RsDirError::InvalidArgument {
            message: "filename must not be null".to_string(),
        })?;
        Ok(Self::new(index_name, file_name, affinity_segment_id))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn hash_code(&self) -> i32 {
        self.hash_code
    }
}

impl IndexScoped for FileReadLockKey {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn affinity_segment_id(&self) -> u32 {
        self.affinity_segment_id
    }

    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> std::result::Result<V::Output, V::Error> {
        visitor.visit_file_read_lock(self)
    }
}

impl PartialEq for FileReadLockKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.file_name == other.file_name && self.index_name == other.index_name)
    }
}

impl Eq for FileReadLockKey {}

impl Hash for FileReadLockKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code);
    }
}

/// `RL|<file>|<index>|<affinity>`
impl fmt::Display for FileReadLockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RL|{}|{}|{}",
            self.file_name, self.index_name, self.affinity_segment_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_form() {
        let key = FileReadLockKey::new("idx", "f", 7);
        assert_eq!(key.to_string(), "RL|f|idx|7");
    }

    #[test]
    fn test_try_new_requires_file_name() {
        let err = FileReadLockKey::try_new("idx", None::<String>, 7).unwrap_err();
        assert!(matches!(err, RsDirError::InvalidArgument { .. }));

        let key = FileReadLockKey::try_new("idx", Some("f"), 7).unwrap();
        assert_eq!(key, FileReadLockKey::new("idx", "f", 0));
    }
}
