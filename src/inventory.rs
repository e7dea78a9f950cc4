//! Listing what is on disk under a save root.
//!
//! Record directories sit exactly three levels below the root
//! (`a/b/rest`). The identifier is the three components joined back
//! together.

use crate::hashpath::is_valid_identifier;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// One record directory and the files in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    pub identifier: String,
    pub dir: PathBuf,
    /// File names, sorted.
    pub files: Vec<String>,
}

/// Every record directory under `save_root`, sorted by identifier.
///
/// A missing root is an empty store. Directories that do not have the
/// shape of a record directory are skipped.
pub fn list_records(save_root: &Path) -> Result<Vec<StoredRecord>, InventoryError> {
    if !save_root.exists() {
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(save_root)
        .min_depth(3)
        .max_depth(3)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(identifier) = identifier_for(save_root, entry.path()) else {
            continue;
        };

        let mut files: Vec<String> = std::fs::read_dir(entry.path())?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();

        records.push(StoredRecord {
            identifier,
            dir: entry.into_path(),
            files,
        });
    }
    Ok(records)
}

fn identifier_for(save_root: &Path, dir: &Path) -> Option<String> {
    let relative = dir.strip_prefix(save_root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [a, b, rest] if a.len() == 1 && b.len() == 1 => {
            let identifier = format!("{a}{b}{rest}");
            is_valid_identifier(&identifier).then_some(identifier)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashpath::record_dir;
    use std::fs;
    use tempfile::TempDir;

    fn make_record(root: &Path, id: &str, files: &[&str]) {
        let dir = record_dir(root, id).unwrap();
        fs::create_dir_all(&dir).unwrap();
        for f in files {
            fs::write(dir.join(f), b"x").unwrap();
        }
    }

    #[test]
    fn missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(list_records(&tmp.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn lists_records_sorted_with_files() {
        let tmp = TempDir::new().unwrap();
        make_record(tmp.path(), "ffee01", &["small.jpg", "large.jpg"]);
        make_record(tmp.path(), "0a1b2c", &["thumb.gif"]);

        let records = list_records(tmp.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].identifier, "0a1b2c");
        assert_eq!(records[0].files, vec!["thumb.gif"]);
        assert_eq!(records[1].identifier, "ffee01");
        assert_eq!(records[1].files, vec!["large.jpg", "small.jpg"]);
        assert_eq!(records[1].dir, tmp.path().join("f/f/ee01"));
    }

    #[test]
    fn skips_foreign_layout() {
        let tmp = TempDir::new().unwrap();
        make_record(tmp.path(), "abcdef", &["large.jpg"]);
        fs::create_dir_all(tmp.path().join("assets/css/vendor")).unwrap();
        fs::write(tmp.path().join("a/b/stray.txt"), b"x").unwrap();

        let records = list_records(tmp.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "abcdef");
    }

    #[test]
    fn empty_record_dir_is_listed() {
        let tmp = TempDir::new().unwrap();
        make_record(tmp.path(), "abcdef", &[]);
        let records = list_records(tmp.path()).unwrap();
        assert!(records[0].files.is_empty());
    }
}
