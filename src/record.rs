//! The host-facing record and upload types.
//!
//! [`ImageRecord`] holds the fields a host persistence layer stores for each
//! image (`identifier`, `content_type`, `original_filename`) plus the
//! per-record overrides and the validation error collection. The host maps
//! these to its own columns, conventionally `hash_string` (32 characters),
//! `content_type` and `original_filename`.

use crate::config::StoreConfig;
use crate::imaging::ContentType;
use crate::sizes::SizeTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Field key under which image processing errors are reported.
pub const FILE_FIELD: &str = "file";

/// Field-keyed validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Messages for `field`, empty if there are none.
    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .flat_map(|(field, msgs)| msgs.iter().map(move |m| (field.as_str(), m.as_str())))
    }
}

/// Uploaded bytes as handed over by a form layer.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub original_filename: Option<String>,
}

impl Upload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            original_filename: None,
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = Some(name.into());
        self
    }

    /// Read an upload from disk, keeping the file name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self {
            bytes,
            original_filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// An image record as seen by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRecord {
    identifier: Option<String>,
    pub content_type: Option<ContentType>,
    pub original_filename: Option<String>,
    /// Per-record size table. `None` uses the store's configured sizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<SizeTable>,
    /// Per-record public read root. `None` uses the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_path: Option<String>,
    /// Per-record save root. `None` uses the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<PathBuf>,
    #[serde(default)]
    persisted: bool,
    #[serde(skip)]
    pub errors: ValidationErrors,
}

impl ImageRecord {
    /// A record that has never been saved.
    pub fn new() -> Self {
        Self::default()
    }

    /// A record loaded from the host's storage.
    pub fn persisted(identifier: impl Into<String>, content_type: Option<ContentType>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            content_type,
            persisted: true,
            ..Self::default()
        }
    }

    /// The identifier, if one has been allocated. Empty strings count as absent.
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|id| !id.is_empty())
    }

    /// Assign an identifier. Returns false and changes nothing if the record
    /// already has one.
    pub fn assign_identifier(&mut self, identifier: String) -> bool {
        if self.identifier().is_some() {
            return false;
        }
        self.identifier = Some(identifier);
        true
    }

    pub fn is_new(&self) -> bool {
        !self.persisted
    }

    /// Called by the host once the record has been stored.
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Sizes in effect for this record.
    pub fn sizes<'a>(&'a self, config: &'a StoreConfig) -> &'a SizeTable {
        self.sizes.as_ref().unwrap_or(&config.sizes)
    }

    pub fn read_root<'a>(&'a self, config: &'a StoreConfig) -> &'a str {
        self.read_path.as_deref().unwrap_or(&config.read_path)
    }

    pub fn save_root<'a>(&'a self, config: &'a StoreConfig) -> &'a Path {
        self.save_path.as_deref().unwrap_or(&config.save_path)
    }

    /// `gif` for animated records, `jpg` otherwise.
    pub fn extension(&self) -> &'static str {
        self.content_type.unwrap_or(ContentType::Jpeg).extension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::SizeSpec;

    #[test]
    fn errors_collect_per_field() {
        let mut errors = ValidationErrors::default();
        assert!(errors.is_empty());
        errors.add(FILE_FIELD, "first");
        errors.add(FILE_FIELD, "second");
        errors.add("title", "blank");

        assert_eq!(errors.get(FILE_FIELD), ["first", "second"]);
        assert_eq!(errors.get("missing"), &[] as &[String]);
        assert_eq!(errors.iter().count(), 3);

        errors.clear();
        assert!(errors.is_empty());
    }

    #[test]
    fn identifier_is_assigned_once() {
        let mut record = ImageRecord::new();
        assert_eq!(record.identifier(), None);
        assert!(record.assign_identifier("abc123".into()));
        assert!(!record.assign_identifier("zzz999".into()));
        assert_eq!(record.identifier(), Some("abc123"));
    }

    #[test]
    fn empty_identifier_counts_as_absent() {
        let mut record = ImageRecord::persisted("", None);
        assert_eq!(record.identifier(), None);
        assert!(record.assign_identifier("fresh".into()));
    }

    #[test]
    fn new_and_persisted() {
        let mut record = ImageRecord::new();
        assert!(record.is_new());
        record.mark_persisted();
        assert!(!record.is_new());
        assert!(!ImageRecord::persisted("abc", None).is_new());
    }

    #[test]
    fn sizes_fall_back_to_config() {
        let config = StoreConfig::default();
        let mut record = ImageRecord::new();
        assert_eq!(record.sizes(&config), &config.sizes);

        let mut own = SizeTable::new();
        own.insert("tiny", SizeSpec::scale("10x10".parse().unwrap()));
        record.sizes = Some(own.clone());
        assert_eq!(record.sizes(&config), &own);
    }

    #[test]
    fn per_record_copy_is_independent_of_config() {
        let mut config = StoreConfig::default();
        let mut record = ImageRecord::new();
        record.sizes = Some(config.sizes.clone());

        config
            .sizes
            .insert("huge", SizeSpec::scale("4000x4000".parse().unwrap()));
        assert!(record.sizes(&config).get("huge").is_none());
    }

    #[test]
    fn extension_follows_content_type() {
        let mut record = ImageRecord::new();
        assert_eq!(record.extension(), "jpg");
        record.content_type = Some(ContentType::Gif);
        assert_eq!(record.extension(), "gif");
    }

    #[test]
    fn upload_from_path_keeps_filename() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("holiday.png");
        std::fs::write(&path, b"bytes").unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.original_filename.as_deref(), Some("holiday.png"));
        assert!(!upload.is_empty());
        assert!(Upload::default().is_empty());
    }
}
