//! Index-scoped cache keys
//!
//! Every entry a directory stores in the cache is addressed by one of the
//! key types below. All of them name the index they belong to and carry an
//! affinity segment id, a placement hint that is persisted with the key but
//! never takes part in equality or hashing.
//!
//! Callers that need per-variant behaviour implement [`KeyVisitor`] and hand
//! it to [`IndexScoped::accept`]; the key picks the visitor method matching
//! its own type.

pub mod chunk;
pub mod file;
pub mod file_list;
pub mod read_lock;

use std::fmt;

pub use chunk::ChunkCacheKey;
pub use file::FileCacheKey;
pub use file_list::FileListCacheKey;
pub use read_lock::FileReadLockKey;

/// Multiplier of the field-combining hash.
pub(crate) const HASH_PRIME: i32 = 31;

/// `java.lang.String::hashCode`: polynomial over UTF-16 code units with
/// wrapping 32-bit arithmetic.
pub fn java_string_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_mul(HASH_PRIME).wrapping_add(i32::from(unit))
    })
}

/// Hash of a key identified by a file within an index:
/// `31 * (31 + h(file)) + h(index)`.
pub(super) fn file_scoped_hash(file_name: &str, index_name: &str) -> i32 {
    let result = HASH_PRIME.wrapping_add(java_string_hash(file_name));
    HASH_PRIME
        .wrapping_mul(result)
        .wrapping_add(java_string_hash(index_name))
}

/// Variant-specific behaviour supplied from outside the key family.
///
/// Errors raised by a visitor are returned by `accept` exactly as produced.
pub trait KeyVisitor {
    type Output;
    type Error;

    fn visit_file(&mut self, key: &FileCacheKey) -> Result<Self::Output, Self::Error>;
    fn visit_chunk(&mut self, key: &ChunkCacheKey) -> Result<Self::Output, Self::Error>;
    fn visit_file_list(&mut self, key: &FileListCacheKey) -> Result<Self::Output, Self::Error>;
    fn visit_file_read_lock(
        &mut self,
        key: &FileReadLockKey,
    ) -> Result<Self::Output, Self::Error>;
}

/// Behaviour shared by every key of the family.
pub trait IndexScoped {
    /// Name of the index this key belongs to.
    fn index_name(&self) -> &str;

    /// Placement hint for segment ownership; not part of the key identity.
    fn affinity_segment_id(&self) -> u32;

    /// Double dispatch into `visitor`.
    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> Result<V::Output, V::Error>;
}

/// Discriminant of the closed key family, used by the externalizer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    File,
    Chunk,
    FileList,
    FileReadLock,
}

impl KeyKind {
    pub const ALL: [KeyKind; 4] = [
        KeyKind::File,
        KeyKind::Chunk,
        KeyKind::FileList,
        KeyKind::FileReadLock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::File => "FileCacheKey",
            KeyKind::Chunk => "ChunkCacheKey",
            KeyKind::FileList => "FileListCacheKey",
            KeyKind::FileReadLock => "FileReadLockKey",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any key of the family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexScopedKey {
    File(FileCacheKey),
    Chunk(ChunkCacheKey),
    FileList(FileListCacheKey),
    FileReadLock(FileReadLockKey),
}

impl IndexScopedKey {
    pub fn kind(&self) -> KeyKind {
        match self {
            IndexScopedKey::File(_) => KeyKind::File,
            IndexScopedKey::Chunk(_) => KeyKind::Chunk,
            IndexScopedKey::FileList(_) => KeyKind::FileList,
            IndexScopedKey::FileReadLock(_) => KeyKind::FileReadLock,
        }
    }
}

impl IndexScoped for IndexScopedKey {
    fn index_name(&self) -> &str {
        match self {
            IndexScopedKey::File(k) => k.index_name(),
            IndexScopedKey::Chunk(k) => k.index_name(),
            IndexScopedKey::FileList(k) => k.index_name(),
            IndexScopedKey::FileReadLock(k) => k.index_name(),
        }
    }

    fn affinity_segment_id(&self) -> u32 {
        match self {
            IndexScopedKey::File(k) => k.affinity_segment_id(),
            IndexScopedKey::Chunk(k) => k.affinity_segment_id(),
            IndexScopedKey::FileList(k) => k.affinity_segment_id(),
            IndexScopedKey::FileReadLock(k) => k.affinity_segment_id(),
        }
    }

    fn accept<V: KeyVisitor>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        match self {
            IndexScopedKey::File(k) => k.accept(visitor),
            IndexScopedKey::Chunk(k) => k.accept(visitor),
            IndexScopedKey::FileList(k) => k.accept(visitor),
            IndexScopedKey::FileReadLock(k) => k.accept(visitor),
        }
    }
}

impl fmt::Display for IndexScopedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexScopedKey::File(k) => fmt::Display::fmt(k, f),
            IndexScopedKey::Chunk(k) => fmt::Display::fmt(k, f),
            IndexScopedKey::FileList(k) => fmt::Display::fmt(k, f),
            IndexScopedKey::FileReadLock(k) => fmt::Display::fmt(k, f),
        }
    }
}

impl From<FileCacheKey> for IndexScopedKey {
    fn from(key: FileCacheKey) -> Self {
        IndexScopedKey::File(key)
    }
}

impl From<ChunkCacheKey> for IndexScopedKey {
    fn from(key: ChunkCacheKey) -> Self {
        IndexScopedKey::Chunk(key)
    }
}

impl From<FileListCacheKey> for IndexScopedKey {
    fn from(key: FileListCacheKey) -> Self {
        IndexScopedKey::FileList(key)
    }
}

impl From<FileReadLockKey> for IndexScopedKey {
    fn from(key: FileReadLockKey) -> Self {
        IndexScopedKey::FileReadLock(key)
    }
}
