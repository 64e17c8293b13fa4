use std::fmt;
use std::hash::{Hash, Hasher};

use super::{IndexScoped, KeyVisitor, file_scoped_hash};
use crate::common::{Result, RsDirError};

/// Key of a file header entry: addresses one file of one index.
///
/// Identity is `(file_name, index_name)`. The affinity segment id travels
/// with the key and is persisted, but two keys differing only in affinity are
/// the same key.
#[derive(Debug, Clone)]
pub struct FileCacheKey {
    index_name: String,
    file_name: String,
    affinity_segment_id: u32,
    hash_code: i32,
}

impl FileCacheKey {
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

    /// Fails with [`RsDirError::InvalidArgument`] when `file_name` is absent.
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

    /// The hash computed at construction.
    pub fn hash_code(&self) -> i32 {
        self.hash_code
    }
}

impl IndexScoped for FileCacheKey {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn affinity_segment_id(&self) -> u32 {
        self.affinity_segment_id
    }

    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> std::result::Result<V::Output, V::Error> {
        visitor.visit_file(self)
    }
}

impl PartialEq for FileCacheKey {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || (self.file_name == other.file_name && self.index_name == other.index_name)
    }
}

impl Eq for FileCacheKey {}

impl Hash for FileCacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i32(self.hash_code);
    }
}

/// `M|<file>|<index>|<affinity>`. Other components parse this form back into
/// a key, so the tag, delimiter and field order must not change.
impl fmt::Display for FileCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "M|{}|{}|{}",
            self.file_name, self.index_name, self.affinity_segment_id
        )
    }
}
