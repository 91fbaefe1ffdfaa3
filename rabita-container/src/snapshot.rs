//! Persistent singleton snapshots.
//!
//! A snapshot is a set of `key → serialized instance` records addressed by
//! a fingerprint of the container's binding set. The container only marks
//! itself dirty when a singleton is cached and tries one load before its
//! first resolution; serializing instances is left to an [`InstanceCodec`].
//!
//! # Format
//! ```text
//! u32 magic "RBTA" | u32 version | u32 entry count
//! repeated: u32 key len | key (UTF-8) | u32 value len | value
//! ```
//! All integers are little-endian.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::instance::Instance;
use crate::key::Identifier;
use crate::settings::ContainerSettings;

pub const MAGIC: u32 = u32::from_le_bytes(*b"RBTA");
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("not a snapshot (magic {found:#010x})")]
    BadMagic { found: u32 },

    #[error("unsupported snapshot version {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("snapshot is truncated")]
    Truncated,

    #[error("snapshot key is not valid UTF-8")]
    KeyNotUtf8,
}

/// Decoded snapshot payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<(String, Vec<u8>)>,
}

impl Snapshot {
    pub fn encode(&self) -> Vec<u8> {
        let body: usize = self
            .entries
            .iter()
            .map(|(k, v)| 8 + k.len() + v.len())
            .sum();
        let mut out = Vec::with_capacity(12 + body);

        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for (key, value) in &self.entries {
            out.extend_from_slice(&(key.len() as u32).to_le_bytes());
            out.extend_from_slice(key.as_bytes());
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
            out.extend_from_slice(value);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let mut reader = Reader { bytes, pos: 0 };

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(SnapshotError::BadMagic { found: magic });
        }
        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion { found: version });
        }

        let count = reader.u32()? as usize;
        // Every record takes at least 8 bytes.
        let mut entries = Vec::with_capacity(count.min(reader.remaining() / 8));
        for _ in 0..count {
            let key_len = reader.u32()? as usize;
            let key = std::str::from_utf8(reader.take(key_len)?)
                .map_err(|_| SnapshotError::KeyNotUtf8)?
                .to_string();
            let value_len = reader.u32()? as usize;
            let value = reader.take(value_len)?.to_vec();
            entries.push((key, value));
        }

        Ok(Self { entries })
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], SnapshotError> {
        if self.remaining() < len {
            return Err(SnapshotError::Truncated);
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, SnapshotError> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }
}

/// Opaque storage for snapshot payloads.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, fingerprint: u64) -> Result<Option<Vec<u8>>, SnapshotError>;

    fn save(&self, fingerprint: u64, payload: &[u8]) -> Result<(), SnapshotError>;

    fn remove(&self, fingerprint: u64) -> Result<(), SnapshotError>;

    /// Where the payload for `fingerprint` lives, for diagnostics.
    fn locate(&self, fingerprint: u64) -> String;
}

/// Serializes cached instances. Returning `None` skips the entry.
pub trait InstanceCodec: Send + Sync {
    fn encode(&self, key: &Identifier, instance: &Instance) -> Option<Vec<u8>>;

    fn decode(&self, key: &Identifier, bytes: &[u8]) -> Option<Instance>;
}

/// One file per fingerprint: `{dir}/rabita_snapshot_{fingerprint:016x}.bin`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_settings(settings: &ContainerSettings) -> Self {
        Self::new(settings.snapshot_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, fingerprint: u64) -> PathBuf {
        self.dir
            .join(format!("rabita_snapshot_{fingerprint:016x}.bin"))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, fingerprint: u64) -> Result<Option<Vec<u8>>, SnapshotError> {
        match fs::read(self.path_for(fingerprint)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes to a private temp file in the same directory, then renames it
    /// over the snapshot, so readers see either the old or the new payload.
    fn save(&self, fingerprint: u64, payload: &[u8]) -> Result<(), SnapshotError> {
        let path = self.path_for(fingerprint);
        let mut staged = tempfile::Builder::new()
            .prefix(".rabita_snapshot_")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;

        staged.write_all(payload)?;
        staged.as_file().sync_all()?;
        staged.persist(&path).map_err(|err| err.error)?;

        debug!(path = %path.display(), bytes = payload.len(), "Wrote snapshot");
        Ok(())
    }

    fn remove(&self, fingerprint: u64) -> Result<(), SnapshotError> {
        match fs::remove_file(self.path_for(fingerprint)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn locate(&self, fingerprint: u64) -> String {
        self.path_for(fingerprint).display().to_string()
    }
}

/// In-process store, shareable between containers.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    payloads: Mutex<AHashMap<u64, Vec<u8>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.payloads.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.lock().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, fingerprint: u64) -> Result<Option<Vec<u8>>, SnapshotError> {
        Ok(self.payloads.lock().get(&fingerprint).cloned())
    }

    fn save(&self, fingerprint: u64, payload: &[u8]) -> Result<(), SnapshotError> {
        self.payloads.lock().insert(fingerprint, payload.to_vec());
        Ok(())
    }

    fn remove(&self, fingerprint: u64) -> Result<(), SnapshotError> {
        self.payloads.lock().remove(&fingerprint);
        Ok(())
    }

    fn locate(&self, fingerprint: u64) -> String {
        format!("memory://{fingerprint:016x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            entries: vec![
                ("App\\Config".into(), b"{\"debug\":true}".to_vec()),
                ("App\\Empty".into(), Vec::new()),
            ],
        }
    }

    #[test]
    fn header_layout() {
        let bytes = sample().encode();
        assert_eq!(&bytes[0..4], b"RBTA");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 1);
        assert_eq!(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]), 2);
        assert_eq!(Snapshot::decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample().encode();
        bytes[0] = b'X';
        assert!(matches!(Snapshot::decode(&bytes), Err(SnapshotError::BadMagic { .. })));
    }

    #[test]
    fn rejects_other_versions() {
        let mut bytes = sample().encode();
        bytes[4] = 2;
        match Snapshot::decode(&bytes).unwrap_err() {
            SnapshotError::UnsupportedVersion { found } => assert_eq!(found, 2),
            other => panic!("Expected UnsupportedVersion, got: {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = sample().encode();
        assert!(matches!(
            Snapshot::decode(&bytes[..bytes.len() - 3]),
            Err(SnapshotError::Truncated)
        ));
        assert!(matches!(Snapshot::decode(&bytes[..6]), Err(SnapshotError::Truncated)));
    }

    #[test]
    fn huge_count_does_not_preallocate() {
        let mut bytes = Snapshot::default().encode();
        bytes[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(Snapshot::decode(&bytes), Err(SnapshotError::Truncated)));
    }

    #[test]
    fn rejects_non_utf8_keys() {
        let mut bytes = Snapshot {
            entries: vec![("ab".into(), vec![1])],
        }
        .encode();
        bytes[16] = 0xFF;
        assert!(matches!(Snapshot::decode(&bytes), Err(SnapshotError::KeyNotUtf8)));
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        assert_eq!(store.load(7).unwrap(), None);
        store.save(7, b"payload").unwrap();
        assert_eq!(store.load(7).unwrap(), Some(b"payload".to_vec()));
        assert!(store.locate(7).ends_with("rabita_snapshot_0000000000000007.bin"));

        store.remove(7).unwrap();
        assert_eq!(store.load(7).unwrap(), None);
        store.remove(7).unwrap();
    }

    #[test]
    fn file_store_replaces_payload_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());

        store.save(3, b"first payload, rather long").unwrap();
        store.save(3, b"second").unwrap();
        assert_eq!(store.load(3).unwrap(), Some(b"second".to_vec()));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, [std::ffi::OsString::from("rabita_snapshot_0000000000000003.bin")]);
    }

    #[test]
    fn file_store_save_fails_for_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("missing"));
        assert!(matches!(store.save(1, b"x"), Err(SnapshotError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        store.save(1, b"x").unwrap();

        let mode = fs::metadata(store.path_for(1)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySnapshotStore::new();
        store.save(1, b"a").unwrap();
        assert_eq!(store.load(1).unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.len(), 1);
        store.remove(1).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.locate(255), "memory://00000000000000ff");
    }
}
