use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{Result, TzError};
use crate::types::RingKey;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encode a timezone id the way ring directories are named on disk
/// (`America/New_York` -> `America%2FNew_York`).
pub fn encode_timezone_id(timezone_id: &str) -> String {
    utf8_percent_encode(timezone_id, URI_COMPONENT).to_string()
}

/// Inverse of [`encode_timezone_id`].
pub fn decode_timezone_id(encoded: &str) -> Result<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| TzError::Artifact(format!("timezone id {encoded:?} is not valid UTF-8: {e}")))
}

/// Backing storage for ring files.
///
/// Implementations only fetch bytes; decoding and caching belong to
/// [`PolygonStore`](super::PolygonStore).
pub trait RingSource: Send + Sync {
    fn read(&self, key: &RingKey) -> io::Result<Vec<u8>>;
}

/// Ring files on the local filesystem, laid out as
/// `<root>/<encoded timezone id>/<ring index>.bin`.
#[derive(Debug, Clone)]
pub struct FsRingSource {
    root: PathBuf,
}

impl FsRingSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the ring file for `key`.
    ///
    /// The directory is the key's `dir_name` when set (the id as the
    /// artifact spelled it), otherwise the canonical encoding of the id.
    pub fn ring_path(&self, key: &RingKey) -> io::Result<PathBuf> {
        let dir = match &key.dir_name {
            Some(dir) => dir.clone(),
            None => encode_timezone_id(&key.timezone_id),
        };

        // A raw spelling may contain '/', which nests like a path join.
        // Empty, "." and ".." segments would escape the ring directory.
        let mut path = self.root.clone();
        for segment in dir.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("timezone id {:?} cannot name a ring directory", key.timezone_id),
                ));
            }
            path.push(segment);
        }
        path.push(format!("{}.bin", key.ring_index));
        Ok(path)
    }
}

impl RingSource for FsRingSource {
    fn read(&self, key: &RingKey) -> io::Result<Vec<u8>> {
        let path = self.ring_path(key)?;
        fs::read(&path).map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    }
}

/// Ring files held in memory, keyed like the filesystem layout.
///
/// Handy for embedding a small dataset or for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRingSource {
    rings: HashMap<RingKey, Vec<u8>>,
}

impl MemoryRingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw ring-file bytes for `key`, replacing any previous entry.
    pub fn insert(&mut self, key: RingKey, bytes: Vec<u8>) {
        self.rings.insert(key, bytes);
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

impl RingSource for MemoryRingSource {
    fn read(&self, key: &RingKey) -> io::Result<Vec<u8>> {
        self.rings.get(key).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no ring stored for {key}"))
        })
    }
}
