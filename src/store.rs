//! The store facade a host application talks to.
//!
//! [`ImageStore`] bundles a [`StoreConfig`], an [`ImageBackend`] and an
//! [`IdentifierIndex`] and exposes the record lifecycle:
//!
//! | Host event | Call |
//! |---|---|
//! | validation | [`ImageStore::validate`] or [`ImageStore::try_save`] |
//! | deletion | [`ImageStore::destroy`] |
//! | rendering | [`ImageStore::url`], [`ImageStore::path`] |
//!
//! ```no_run
//! use hashpix::{DirectoryIndex, ImageRecord, ImageStore, StoreConfig, Upload};
//!
//! let config = StoreConfig::default();
//! let index = DirectoryIndex::new(&config.save_path);
//! let store = ImageStore::new(config, index);
//!
//! let mut record = ImageRecord::new();
//! let upload = Upload::from_path("cat.png".as_ref()).unwrap();
//! if store.validate(&mut record, Some(&upload)) {
//!     println!("{}", store.url(&record, None, None).unwrap());
//! }
//! ```

use crate::config::StoreConfig;
use crate::hashpath::{
    self, IdentifierIndex, ensure_identifier, relative_path, variant_filename, variant_read_url,
};
use crate::imaging::{ContentType, ImageBackend, RustBackend};
use crate::process::{ProcessingError, delete_variant_files, process_upload};
use crate::record::{FILE_FIELD, ImageRecord, Upload};
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedRecord {
    pub identifier: String,
    pub content_type: Option<ContentType>,
    pub original_filename: Option<String>,
    /// Files written by this save, in size-table order. Empty when a
    /// persisted record was saved without a new upload.
    pub variants: Vec<PathBuf>,
}

pub struct ImageStore<B, I> {
    config: StoreConfig,
    backend: B,
    index: I,
}

impl<I: IdentifierIndex> ImageStore<RustBackend, I> {
    /// A store using the pure-Rust imaging backend.
    pub fn new(config: StoreConfig, index: I) -> Self {
        Self::with_backend(config, RustBackend::new(), index)
    }
}

impl<B: ImageBackend, I: IdentifierIndex> ImageStore<B, I> {
    pub fn with_backend(config: StoreConfig, backend: B, index: I) -> Self {
        Self {
            config,
            backend,
            index,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Validation hook: allocate an identifier, process the upload and
    /// report whether the record may be stored. Errors land in
    /// `record.errors`.
    pub fn validate(&self, record: &mut ImageRecord, upload: Option<&Upload>) -> bool {
        self.try_save(record, upload).is_ok()
    }

    /// Allocate an identifier if needed and write every variant of `upload`.
    pub fn try_save(
        &self,
        record: &mut ImageRecord,
        upload: Option<&Upload>,
    ) -> Result<SavedRecord, ProcessingError> {
        let allocated = ensure_identifier(record, &self.index).map(|_| ());
        if let Err(e) = allocated {
            let e = ProcessingError::from(e);
            record.errors.add(FILE_FIELD, e.to_string());
            return Err(e);
        }
        let variants = process_upload(&self.backend, record, upload, &self.config)?;
        Ok(SavedRecord {
            identifier: record.identifier().unwrap_or_default().to_string(),
            content_type: record.content_type,
            original_filename: record.original_filename.clone(),
            variants,
        })
    }

    /// Remove the record's files. Never fails; returns what was removed.
    pub fn destroy(&self, record: &ImageRecord) -> Vec<PathBuf> {
        delete_variant_files(record, &self.config)
    }

    /// Public URL of a variant. `size` defaults to the first configured size,
    /// `ext` to the record's own extension.
    pub fn url(
        &self,
        record: &ImageRecord,
        size: Option<&str>,
        ext: Option<&str>,
    ) -> Option<String> {
        let (size, ext) = self.resolve(record, size, ext)?;
        variant_read_url(record.read_root(&self.config), record.identifier()?, size, ext)
    }

    /// The record's relative directory, e.g. `3/f/a9c0e1...`.
    pub fn path(&self, record: &ImageRecord) -> Option<String> {
        relative_path(record.identifier()?)
    }

    /// Filesystem path of a variant, with the same defaults as [`url`](Self::url).
    pub fn variant_path(
        &self,
        record: &ImageRecord,
        size: Option<&str>,
        ext: Option<&str>,
    ) -> Option<PathBuf> {
        let (size, ext) = self.resolve(record, size, ext)?;
        hashpath::variant_path(
            record.save_root(&self.config),
            record.identifier()?,
            size,
            ext,
        )
    }

    /// `{size}.{ext}` with the same defaults as [`url`](Self::url).
    pub fn filename(
        &self,
        record: &ImageRecord,
        size: Option<&str>,
        ext: Option<&str>,
    ) -> Option<String> {
        let (size, ext) = self.resolve(record, size, ext)?;
        Some(variant_filename(size, ext))
    }

    pub fn extension(&self, record: &ImageRecord) -> &'static str {
        record.extension()
    }

    /// Recover a record's content type from the files on disk, for callers
    /// that only know the identifier. Looks at the last size, which decides
    /// the content type when saving.
    pub fn probe_content_type(&self, record: &ImageRecord) -> Option<ContentType> {
        let last = record.sizes(&self.config).names().last()?;
        [ContentType::Gif, ContentType::Jpeg]
            .into_iter()
            .find(|ct| {
                self.variant_path(record, Some(last), Some(ct.extension()))
                    .is_some_and(|p| p.is_file())
            })
    }

    fn resolve<'a>(
        &'a self,
        record: &'a ImageRecord,
        size: Option<&'a str>,
        ext: Option<&'a str>,
    ) -> Option<(&'a str, &'a str)> {
        let size = match size {
            Some(size) => size,
            None => record.sizes(&self.config).first_name()?,
        };
        Some((size, ext.unwrap_or_else(|| record.extension())))
    }
}
