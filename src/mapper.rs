//! Key to string mapping
//!
//! Stores that can only hold string keys (JDBC-style cache stores, for
//! instance) persist keys through their textual form and parse them back on
//! load. The forms are:
//!
//! ```text
//! M|<file>|<index>|<affinity>                     FileCacheKey
//! C|<file>|<chunk>|<buffer size>|<index>|<affinity> ChunkCacheKey
//! *|<index>|<affinity>                            FileListCacheKey
//! RL|<file>|<index>|<affinity>                    FileReadLockKey
//! ```
//!
//! Names are not escaped, so a name containing `|` cannot be mapped back.

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::common::{Result, RsDirError};
use crate::keys::{
    ChunkCacheKey, FileCacheKey, FileListCacheKey, FileReadLockKey, IndexScopedKey, KeyKind,
};

const SEPARATOR: char = '|';

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyMapper;

impl KeyMapper {
    pub fn new() -> Self {
        Self
    }

    /// Every kind of the index key family has a textual form.
    pub fn is_supported_type(&self, kind: KeyKind) -> bool {
        KeyKind::ALL.contains(&kind)
    }

    pub fn string_mapping(&self, key: &IndexScopedKey) -> String {
        key.to_string()
    }

    pub fn key_mapping(&self, key: &str) -> Result<IndexScopedKey> {
        parse(key).ok_or_else(|| {
            log::warn!("Unexpected key mapping format: {key}");
            RsDirError::KeyMapping {
                key: key.to_string(),
            }
        })
    }
}

fn parse(key: &str) -> Option<IndexScopedKey> {
    let parts: Vec<&str> = key.split(SEPARATOR).collect();
    let mapped: IndexScopedKey = match parts.as_slice() {
        ["M", file, index, affinity] => {
            FileCacheKey::new(*index, *file, affinity.parse().ok()?).into()
        }
        ["C", file, chunk, buffer, index, affinity] => ChunkCacheKey::new(
            *index,
            *file,
            chunk.parse().ok()?,
            buffer.parse().ok()?,
            affinity.parse().ok()?,
        )
        .into(),
        ["*", index, affinity] => FileListCacheKey::new(*index, affinity.parse().ok()?).into(),
        ["RL", file, index, affinity] => {
            FileReadLockKey::new(*index, *file, affinity.parse().ok()?).into()
        }
        _ => return None,
    };
    Some(mapped)
}

impl Serialize for IndexScopedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IndexScopedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_str(KeyStringVisitor)
    }
}

struct KeyStringVisitor;

impl Visitor<'_> for KeyStringVisitor {
    type Value = IndexScopedKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an index key mapping such as \"M|file|index|0\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<IndexScopedKey, E> {
        KeyMapper.key_mapping(v).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::IndexScoped;

    #[test]
    fn test_round_trip_every_form() {
        let mapper = KeyMapper::new();
        let keys: Vec<IndexScopedKey> = vec![
            FileCacheKey::new("idx", "f.txt", 7).into(),
            ChunkCacheKey::new("idx", "_1.fdt", 3, 8192, 7).into(),
            FileListCacheKey::new("idx", 7).into(),
            FileReadLockKey::new("idx", "f.txt", 7).into(),
        ];
        for key in keys {
            assert!(mapper.is_supported_type(key.kind()));
            let mapped = mapper.string_mapping(&key);
            let parsed = mapper.key_mapping(&mapped).unwrap();
            assert_eq!(parsed, key);
            assert_eq!(parsed.affinity_segment_id(), 7);
        }
    }

    #[test]
    fn test_file_key_fields_follow_textual_order() {
        let parsed = KeyMapper.key_mapping("M|f.txt|idx|7").unwrap();
        assert_eq!(parsed, IndexScopedKey::from(FileCacheKey::new("idx", "f.txt", 7)));
        assert_eq!(parsed.index_name(), "idx");
    }

    #[test]
    fn test_empty_names_survive() {
        let parsed = KeyMapper.key_mapping("M|||0").unwrap();
        assert_eq!(parsed, IndexScopedKey::from(FileCacheKey::new("", "", 0)));
    }

    #[test]
    fn test_malformed_mappings() {
        for bad in [
            "",
            "M|f.txt|idx",
            "M|f|idx|7|extra",
            "M|f|idx|-1",
            "C|f|x|1|idx|0",
            "X|f|idx|0",
            "*|idx",
            "M|f|i|dx|7",
        ] {
            let err = KeyMapper.key_mapping(bad).unwrap_err();
            assert!(matches!(err, RsDirError::KeyMapping { .. }), "{bad}");
        }
    }

    #[test]
    fn test_serde_uses_textual_form() {
        let key: IndexScopedKey = FileReadLockKey::new("idx", "write.lock", 2).into();
        let bytes = bincode::serialize(&key).unwrap();
        let back: IndexScopedKey = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, key);

        let bytes = bincode::serialize("M|a").unwrap();
        assert!(bincode::deserialize::<IndexScopedKey>(&bytes).is_err());
    }
}
