//! Binary codecs for the key family
//!
//! Each key type has an [`Externalizer`] writing its fields in a fixed order.
//! The order is the wire contract: older readers decode by position, so a
//! field may never be moved or dropped.
//!
//! ```text
//! FileCacheKey      utf index | utf file | varint affinity
//! ChunkCacheKey     utf index | utf file | varint chunk | varint buffer | varint affinity
//! FileListCacheKey  utf index | varint affinity
//! FileReadLockKey   utf index | utf file | varint affinity
//! ```
//!
//! Externalizers are identified by a numeric id assigned by the hosting
//! registry. [`ExternalizerTable`] holds the id of every key kind and writes
//! keys tagged with that id so that a reader can pick the right codec.

use std::io::{Read, Write};

use ahash::AHashMap;

use crate::common::{Config, Result, RsDirError};
use crate::keys::{
    ChunkCacheKey, FileCacheKey, FileListCacheKey, FileReadLockKey, IndexScoped, IndexScopedKey,
    KeyKind, KeyVisitor,
};
use crate::utf::{read_utf, write_utf};
use crate::varint::{read_unsigned_int, write_unsigned_int};

/// Serializer/deserializer for one key type.
pub trait Externalizer {
    type Target;

    /// Type identifier this externalizer is registered under.
    fn id(&self) -> u32;

    /// The single key kind handled.
    fn kind(&self) -> KeyKind;

    /// Writes the fields straight to `out`. A field that fails to encode
    /// (a name over the 65535 byte limit) leaves the fields before it on
    /// `out`; use [`Externalizer::to_bytes`] or
    /// [`ExternalizerTable::write_key`] when a failure must write nothing.
    fn write_object<W: Write>(&self, out: &mut W, key: &Self::Target) -> Result<()>;

    fn read_object<R: Read>(&self, input: &mut R) -> Result<Self::Target>;

    fn to_bytes(&self, key: &Self::Target) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_object(&mut buf, key)?;
        Ok(buf)
    }

    /// Decodes exactly one key; leftover bytes are corruption.
    fn from_bytes(&self, bytes: &[u8]) -> Result<Self::Target> {
        let mut input = bytes;
        let key = self.read_object(&mut input)?;
        ensure_consumed(input, self.kind())?;
        Ok(key)
    }
}

fn ensure_consumed(rest: &[u8], kind: KeyKind) -> Result<()> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(RsDirError::corruption(format!(
            "{} trailing bytes after {kind}",
            rest.len()
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileCacheKeyExternalizer {
    id: u32,
}

impl FileCacheKeyExternalizer {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Externalizer for FileCacheKeyExternalizer {
    type Target = FileCacheKey;

    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> KeyKind {
        KeyKind::File
    }

    fn write_object<W: Write>(&self, out: &mut W, key: &FileCacheKey) -> Result<()> {
        write_utf(out, key.index_name())?;
        write_utf(out, key.file_name())?;
        write_unsigned_int(out, key.affinity_segment_id())
    }

    fn read_object<R: Read>(&self, input: &mut R) -> Result<FileCacheKey> {
        let index_name = read_utf(input, "index name")?;
        let file_name = read_utf(input, "file name")?;
        let affinity_segment_id = read_unsigned_int(input)?;
        Ok(FileCacheKey::new(index_name, file_name, affinity_segment_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkCacheKeyExternalizer {
    id: u32,
}

impl ChunkCacheKeyExternalizer {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Externalizer for ChunkCacheKeyExternalizer {
    type Target = ChunkCacheKey;

    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> KeyKind {
        KeyKind::Chunk
    }

    fn write_object<W: Write>(&self, out: &mut W, key: &ChunkCacheKey) -> Result<()> {
        write_utf(out, key.index_name())?;
        write_utf(out, key.file_name())?;
        write_unsigned_int(out, key.chunk_id())?;
        write_unsigned_int(out, key.buffer_size())?;
        write_unsigned_int(out, key.affinity_segment_id())
    }

    fn read_object<R: Read>(&self, input: &mut R) -> Result<ChunkCacheKey> {
        let index_name = read_utf(input, "index name")?;
        let file_name = read_utf(input, "file name")?;
        let chunk_id = read_unsigned_int(input)?;
        let buffer_size = read_unsigned_int(input)?;
        let affinity_segment_id = read_unsigned_int(input)?;
        Ok(ChunkCacheKey::new(
            index_name,
            file_name,
            chunk_id,
            buffer_size,
            affinity_segment_id,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileListCacheKeyExternalizer {
    id: u32,
}

impl FileListCacheKeyExternalizer {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Externalizer for FileListCacheKeyExternalizer {
    type Target = FileListCacheKey;

    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> KeyKind {
        KeyKind::FileList
    }

    fn write_object<W: Write>(&self, out: &mut W, key: &FileListCacheKey) -> Result<()> {
        write_utf(out, key.index_name())?;
        write_unsigned_int(out, key.affinity_segment_id())
    }

    fn read_object<R: Read>(&self, input: &mut R) -> Result<FileListCacheKey> {
        let index_name = read_utf(input, "index name")?;
        let affinity_segment_id = read_unsigned_int(input)?;
        Ok(FileListCacheKey::new(index_name, affinity_segment_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileReadLockKeyExternalizer {
    id: u32,
}

impl FileReadLockKeyExternalizer {
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

impl Externalizer for FileReadLockKeyExternalizer {
    type Target = FileReadLockKey;

    fn id(&self) -> u32 {
        self.id
    }

    fn kind(&self) -> KeyKind {
        KeyKind::FileReadLock
    }

    fn write_object<W: Write>(&self, out: &mut W, key: &FileReadLockKey) -> Result<()> {
        write_utf(out, key.index_name())?;
        write_utf(out, key.file_name())?;
        write_unsigned_int(out, key.affinity_segment_id())
    }

    fn read_object<R: Read>(&self, input: &mut R) -> Result<FileReadLockKey> {
        let index_name = read_utf(input, "index name")?;
        let file_name = read_utf(input, "file name")?;
        let affinity_segment_id = read_unsigned_int(input)?;
        Ok(FileReadLockKey::new(index_name, file_name, affinity_segment_id))
    }
}

/// Registry of the key externalizers, built once from [`Config`] and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct ExternalizerTable {
    file: FileCacheKeyExternalizer,
    chunk: ChunkCacheKeyExternalizer,
    file_list: FileListCacheKeyExternalizer,
    read_lock: FileReadLockKeyExternalizer,
    by_id: AHashMap<u32, KeyKind>,
}

impl ExternalizerTable {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        let table = Self::build(config);
        log::debug!(
            "Externalizer table ready: {}",
            KeyKind::ALL
                .iter()
                .map(|kind| format!("{kind}={}", table.id_of(*kind)))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(table)
    }

    fn build(config: &Config) -> Self {
        let by_id = [
            (config.file_cache_key_id, KeyKind::File),
            (config.chunk_cache_key_id, KeyKind::Chunk),
            (config.file_list_cache_key_id, KeyKind::FileList),
            (config.file_read_lock_key_id, KeyKind::FileReadLock),
        ]
        .into_iter()
        .collect();

        Self {
            file: FileCacheKeyExternalizer::new(config.file_cache_key_id),
            chunk: ChunkCacheKeyExternalizer::new(config.chunk_cache_key_id),
            file_list: FileListCacheKeyExternalizer::new(config.file_list_cache_key_id),
            read_lock: FileReadLockKeyExternalizer::new(config.file_read_lock_key_id),
            by_id,
        }
    }

    pub fn id_of(&self, kind: KeyKind) -> u32 {
        match kind {
            KeyKind::File => self.file.id(),
            KeyKind::Chunk => self.chunk.id(),
            KeyKind::FileList => self.file_list.id(),
            KeyKind::FileReadLock => self.read_lock.id(),
        }
    }

    pub fn kind_of(&self, id: u32) -> Option<KeyKind> {
        self.by_id.get(&id).copied()
    }

    /// Writes the externalizer id followed by the key's own encoding. The
    /// record is assembled first, so `out` sees either all of it or nothing.
    pub fn write_key<W: Write>(&self, out: &mut W, key: &IndexScopedKey) -> Result<()> {
        log::trace!("Writing {} as externalizer {}", key, self.id_of(key.kind()));
        let mut record = Vec::new();
        key.accept(&mut TaggedWriter {
            table: self,
            out: &mut record,
        })?;
        out.write_all(&record)?;
        Ok(())
    }

    pub fn read_key<R: Read>(&self, input: &mut R) -> Result<IndexScopedKey> {
        let id = read_unsigned_int(input)?;
        let Some(kind) = self.kind_of(id) else {
            log::warn!("Rejecting key with unregistered externalizer id {id}");
            return Err(RsDirError::UnknownExternalizer { id });
        };

        let key: IndexScopedKey = match kind {
            KeyKind::File => self.file.read_object(input)?.into(),
            KeyKind::Chunk => self.chunk.read_object(input)?.into(),
            KeyKind::FileList => self.file_list.read_object(input)?.into(),
            KeyKind::FileReadLock => self.read_lock.read_object(input)?.into(),
        };
        log::trace!("Read {key} through externalizer {id}");
        Ok(key)
    }

    pub fn encode(&self, key: &IndexScopedKey) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_key(&mut buf, key)?;
        Ok(buf)
    }

    /// Decodes exactly one tagged key; leftover bytes are corruption.
    pub fn decode(&self, bytes: &[u8]) -> Result<IndexScopedKey> {
        let mut input = bytes;
        let key = self.read_key(&mut input)?;
        ensure_consumed(input, key.kind())?;
        Ok(key)
    }
}

impl Default for ExternalizerTable {
    fn default() -> Self {
        Self::build(&Config::default())
    }
}

/// Writes the id and payload of whichever key it visits.
struct TaggedWriter<'a, W> {
    table: &'a ExternalizerTable,
    out: &'a mut W,
}

impl<W: Write> KeyVisitor for TaggedWriter<'_, W> {
    type Output = ();
    type Error = RsDirError;

    fn visit_file(&mut self, key: &FileCacheKey) -> Result<()> {
        write_unsigned_int(&mut *self.out, self.table.file.id())?;
        self.table.file.write_object(&mut *self.out, key)
    }

    fn visit_chunk(&mut self, key: &ChunkCacheKey) -> Result<()> {
        write_unsigned_int(&mut *self.out, self.table.chunk.id())?;
        self.table.chunk.write_object(&mut *self.out, key)
    }

    fn visit_file_list(&mut self, key: &FileListCacheKey) -> Result<()> {
        write_unsigned_int(&mut *self.out, self.table.file_list.id())?;
        self.table.file_list.write_object(&mut *self.out, key)
    }

    fn visit_file_read_lock(&mut self, key: &FileReadLockKey) -> Result<()> {
        write_unsigned_int(&mut *self.out, self.table.read_lock.id())?;
        self.table.read_lock.write_object(&mut *self.out, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_keys() -> Vec<IndexScopedKey> {
        vec![
            FileCacheKey::new("idx", "segments_2", 4).into(),
            ChunkCacheKey::new("idx", "_0.cfs", 17, 16_384, 4).into(),
            FileListCacheKey::new("idx", 200).into(),
            FileReadLockKey::new("idx", "_0.cfs", 0).into(),
        ]
    }

    #[test]
    fn test_file_key_wire_layout() {
        let ext = FileCacheKeyExternalizer::new(1300);
        let bytes = ext.to_bytes(&FileCacheKey::new("idx", "f.txt", 300)).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x00, 0x03, b'i', b'd', b'x', // index name
                0x00, 0x05, b'f', b'.', b't', b'x', b't', // file name
                0xAC, 0x02, // affinity 300
            ]
        );
    }

    #[test]
    fn test_round_trip_keeps_affinity() {
        let ext = FileCacheKeyExternalizer::new(1300);
        let key = FileCacheKey::new("idx", "f.txt", 300);
        let decoded = ext.from_bytes(&ext.to_bytes(&key).unwrap()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.affinity_segment_id(), 300);
        assert_eq!(decoded.hash_code(), key.hash_code());
    }

    #[test]
    fn test_truncated_second_field_is_corruption() {
        let ext = FileCacheKeyExternalizer::new(1300);
        let bytes = ext.to_bytes(&FileCacheKey::new("idx", "f.txt", 7)).unwrap();
        // prefix of file name present, body cut after two bytes
        let err = ext.from_bytes(&bytes[..9]).unwrap_err();
        assert!(err.is_corruption(), "{err}");
        assert!(err.to_string().contains("file name"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let ext = FileListCacheKeyExternalizer::new(1302);
        let mut bytes = ext.to_bytes(&FileListCacheKey::new("idx", 1)).unwrap();
        bytes.push(0);
        assert!(ext.from_bytes(&bytes).unwrap_err().is_corruption());
    }

    #[test]
    fn test_chunk_field_order() {
        let ext = ChunkCacheKeyExternalizer::new(1301);
        let bytes = ext.to_bytes(&ChunkCacheKey::new("i", "f", 1, 2, 3)).unwrap();
        assert_eq!(bytes, vec![0, 1, b'i', 0, 1, b'f', 1, 2, 3]);
    }

    #[test]
    fn test_table_round_trips_every_kind() {
        let table = ExternalizerTable::new(&Config::default()).unwrap();
        for key in sample_keys() {
            let bytes = table.encode(&key).unwrap();
            let decoded = table.decode(&bytes).unwrap();
            assert_eq!(decoded, key);
            assert_eq!(decoded.affinity_segment_id(), key.affinity_segment_id());
        }
    }

    #[test]
    fn test_table_prefixes_id() {
        let table = ExternalizerTable::new(&Config::with_base_id(5).unwrap()).unwrap();
        let bytes = table.encode(&FileListCacheKey::new("x", 0).into()).unwrap();
        assert_eq!(bytes[0], 7);
        assert_eq!(table.kind_of(7), Some(KeyKind::FileList));
        assert_eq!(table.id_of(KeyKind::FileReadLock), 8);
    }

    #[test]
    fn test_failed_write_leaves_stream_untouched() {
        let table = ExternalizerTable::default();
        let long_name = "x".repeat(crate::utf::MAX_UTF_LEN + 1);
        let key: IndexScopedKey = FileCacheKey::new("idx", long_name, 0).into();

        let mut out = vec![0xAAu8];
        let err = table.write_key(&mut out, &key).unwrap_err();
        assert!(matches!(err, RsDirError::UtfDataFormat { .. }));
        assert_eq!(out, vec![0xAA]);

        let ext = FileCacheKeyExternalizer::new(1300);
        let IndexScopedKey::File(file_key) = key else {
            unreachable!()
        };
        assert!(ext.to_bytes(&file_key).is_err());
    }

    #[test]
    fn test_unknown_id_rejected() {
        let table = ExternalizerTable::default();
        let mut bytes = Vec::new();
        write_unsigned_int(&mut bytes, 42).unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        let err = table.decode(&bytes).unwrap_err();
        assert!(matches!(err, RsDirError::UnknownExternalizer { id: 42 }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            chunk_cache_key_id: 1300,
            ..Config::default()
        };
        assert!(ExternalizerTable::new(&config).is_err());
    }

    #[test]
    fn test_stream_of_keys() {
        let table = ExternalizerTable::default();
        let keys = sample_keys();
        let mut buf = Vec::new();
        for key in &keys {
            table.write_key(&mut buf, key).unwrap();
        }

        let mut input = buf.as_slice();
        for key in &keys {
            assert_eq!(&table.read_key(&mut input).unwrap(), key);
        }
        assert!(input.is_empty());
    }
}
