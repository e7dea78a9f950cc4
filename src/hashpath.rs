//! Identifier allocation and hashed storage paths.
//!
//! Every record gets a 32-character hex identifier. Its files live in a
//! three-level directory derived from that identifier:
//!
//! ```text
//! {save_root}/3/f/a9c0e1.../large.jpg
//!             │ │ └─ rest of the identifier
//!             │ └─── second character
//!             └───── first character
//! ```
//!
//! The first two levels have at most 16 entries each, so no directory ever
//! holds more than a bounded fan-out of children no matter how many records
//! exist.
//!
//! Identifiers are allocated lazily by [`ensure_identifier`]: candidates are
//! generated until one is not already known to the [`IdentifierIndex`]. The
//! loop has no upper bound.

use crate::record::ImageRecord;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

/// Length of a generated identifier in hex characters.
pub const IDENTIFIER_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Identifier lookup failed: {0}")]
    Lookup(String),
}

/// Answers "does a record with this identifier already exist?".
///
/// This is the one query the allocator needs from the host's storage.
pub trait IdentifierIndex: Sync {
    fn contains(&self, identifier: &str) -> Result<bool, IndexError>;
}

/// Any `Fn(&str) -> bool` works as an index, e.g. a closure over the host's
/// database handle.
impl<F> IdentifierIndex for F
where
    F: Fn(&str) -> bool + Sync,
{
    fn contains(&self, identifier: &str) -> Result<bool, IndexError> {
        Ok(self(identifier))
    }
}

/// An identifier is taken if its record directory exists under the save root.
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    save_root: PathBuf,
}

impl DirectoryIndex {
    pub fn new(save_root: impl Into<PathBuf>) -> Self {
        Self {
            save_root: save_root.into(),
        }
    }
}

impl IdentifierIndex for DirectoryIndex {
    fn contains(&self, identifier: &str) -> Result<bool, IndexError> {
        match record_dir(&self.save_root, identifier) {
            Some(dir) => Ok(dir.try_exists()?),
            None => Ok(false),
        }
    }
}

/// In-memory set of taken identifiers.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    ids: Mutex<HashSet<String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identifier: impl Into<String>) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identifier.into())
    }

    pub fn remove(&self, identifier: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identifier)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Into<String>> FromIterator<S> for MemoryIndex {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            ids: Mutex::new(iter.into_iter().map(Into::into).collect()),
        }
    }
}

impl IdentifierIndex for MemoryIndex {
    fn contains(&self, identifier: &str) -> Result<bool, IndexError> {
        Ok(self
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(identifier))
    }
}

/// Generate a candidate identifier.
///
/// SHA-256 over the current time in nanoseconds, a process-wide counter and
/// the process id, truncated to [`IDENTIFIER_LEN`] hex characters. The
/// counter keeps two calls within the same clock tick apart.
pub fn generate_candidate() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(IDENTIFIER_LEN);
    hex
}

/// Make sure `record` has an identifier, allocating one if needed.
///
/// Existing identifiers are returned untouched.
pub fn ensure_identifier<'r>(
    record: &'r mut ImageRecord,
    index: &impl IdentifierIndex,
) -> Result<&'r str, IndexError> {
    ensure_identifier_with(record, index, generate_candidate)
}

/// [`ensure_identifier`] with an explicit candidate source.
///
/// Candidates that are taken or unusable as a path are skipped.
pub fn ensure_identifier_with<'r>(
    record: &'r mut ImageRecord,
    index: &impl IdentifierIndex,
    mut next_candidate: impl FnMut() -> String,
) -> Result<&'r str, IndexError> {
    if record.identifier().is_none() {
        let mut attempts = 0u32;
        let identifier = loop {
            let candidate = next_candidate();
            attempts += 1;
            if is_valid_identifier(&candidate) && !index.contains(&candidate)? {
                break candidate;
            }
            debug!(candidate = %candidate, attempts, "identifier rejected, retrying");
        };
        info!(identifier = %identifier, attempts, "allocated identifier");
        record.assign_identifier(identifier);
    }
    Ok(record.identifier().unwrap_or_default())
}

/// Identifiers must be at least three ASCII alphanumeric (or `-`/`_`)
/// characters, so they can never escape the save root or collapse into a
/// fan-out directory.
pub fn is_valid_identifier(identifier: &str) -> bool {
    identifier.len() >= 3
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Split an identifier into (first char, second char, rest).
pub fn path_segments(identifier: &str) -> Option<[&str; 3]> {
    if !is_valid_identifier(identifier) {
        return None;
    }
    Some([&identifier[..1], &identifier[1..2], &identifier[2..]])
}

/// The record's own sub-path, e.g. `3/f/a9c0e1...`.
pub fn relative_path(identifier: &str) -> Option<String> {
    path_segments(identifier).map(|segments| segments.join("/"))
}

/// The directory holding every variant of a record.
pub fn record_dir(save_root: &Path, identifier: &str) -> Option<PathBuf> {
    let [a, b, rest] = path_segments(identifier)?;
    Some(save_root.join(a).join(b).join(rest))
}

/// `{size_name}.{extension}`
pub fn variant_filename(size_name: &str, extension: &str) -> String {
    format!("{}.{}", size_name, extension)
}

/// Filesystem path of one variant.
pub fn variant_path(
    save_root: &Path,
    identifier: &str,
    size_name: &str,
    extension: &str,
) -> Option<PathBuf> {
    record_dir(save_root, identifier).map(|dir| dir.join(variant_filename(size_name, extension)))
}

/// Public URL of one variant: `/{read_root}/{a}/{b}/{rest}/{size}.{ext}`.
pub fn variant_read_url(
    read_root: &str,
    identifier: &str,
    size_name: &str,
    extension: &str,
) -> Option<String> {
    let own = relative_path(identifier)?;
    let file = variant_filename(size_name, extension);
    let root = read_root.trim_matches('/');
    Some(if root.is_empty() {
        format!("/{}/{}", own, file)
    } else {
        format!("/{}/{}/{}", root, own, file)
    })
}
