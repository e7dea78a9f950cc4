//! Upload processing: decode, resize per size, write with rollback.
//!
//! ## Pipeline
//!
//! ```text
//! upload bytes ──decode──► frames ──resize (per size, in parallel)──► variants
//!                                                                        │
//!        {save_root}/a/b/rest/{size}.jpg|gif ◄──write (table order)──────┘
//! ```
//!
//! Every stage maps its failure to one [`ProcessingError`] whose message is
//! attached to the record under [`FILE_FIELD`]. A failed attempt leaves no
//! files from that attempt on disk.
//!
//! Still images are written as JPEG, anything with more than one frame as a
//! looping GIF. The record's `content_type` follows the last size written.

use crate::config::StoreConfig;
use crate::hashpath::{IndexError, record_dir, variant_filename};
use crate::imaging::{
    BackendError, ContentType, FrameSet, ImageBackend, Quality, create_variant, write_variant,
};
use crate::record::{FILE_FIELD, ImageRecord, Upload};
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("No file.")]
    MissingFile,
    #[error("Could not read image. Are you sure this is an image file?")]
    Decode(#[source] BackendError),
    #[error("Could not scale image.")]
    Resize(#[source] BackendError),
    #[error("Could not write image.")]
    Write(#[source] BackendError),
    #[error("Could not allocate an identifier: {0}")]
    Allocation(#[from] IndexError),
    #[error("Record has no usable identifier.")]
    Unallocated,
}

/// Process an upload for `record` and write one file per configured size.
///
/// Returns the paths written. With no bytes to process, a new record fails
/// with [`ProcessingError::MissingFile`] while a persisted one is left as is.
/// The record must already carry an identifier.
///
/// On failure the message is added to `record.errors` under `file`.
pub fn process_upload(
    backend: &impl ImageBackend,
    record: &mut ImageRecord,
    upload: Option<&Upload>,
    config: &StoreConfig,
) -> Result<Vec<PathBuf>, ProcessingError> {
    let result = run(backend, record, upload, config);
    if let Err(e) = &result {
        record.errors.add(FILE_FIELD, e.to_string());
    }
    result
}

fn run(
    backend: &impl ImageBackend,
    record: &mut ImageRecord,
    upload: Option<&Upload>,
    config: &StoreConfig,
) -> Result<Vec<PathBuf>, ProcessingError> {
    let upload = match upload.filter(|u| !u.is_empty()) {
        Some(upload) => upload,
        None if record.is_new() => return Err(ProcessingError::MissingFile),
        None => return Ok(Vec::new()),
    };

    let identifier = record
        .identifier()
        .ok_or(ProcessingError::Unallocated)?
        .to_string();
    let dir = record_dir(record.save_root(config), &identifier)
        .ok_or(ProcessingError::Unallocated)?;

    if upload.original_filename.is_some() {
        record.original_filename = upload.original_filename.clone();
    }

    let sizes = record.sizes(config).clone();
    info!(
        identifier = %identifier,
        bytes = upload.bytes.len(),
        sizes = sizes.len(),
        "processing upload"
    );

    let original = backend
        .decode(&upload.bytes)
        .map_err(ProcessingError::Decode)?;
    debug!(
        frames = original.len(),
        width = original.dimensions().width,
        height = original.dimensions().height,
        "decoded upload"
    );

    let variants = sizes
        .entries()
        .par_iter()
        .map(|(name, spec)| create_variant(backend, &original, spec).map(|frames| (name, frames)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ProcessingError::Resize)?;
    drop(original);

    let quality = Quality::new(config.images.quality);
    let previous = record.content_type;
    let mut written = Vec::with_capacity(variants.len());
    match write_all(backend, record, &dir, &variants, quality, &mut written) {
        Ok(()) => {
            info!(identifier = %identifier, files = written.len(), "wrote variants");
            Ok(written)
        }
        Err(e) => {
            warn!(identifier = %identifier, error = %e, "write failed, rolling back");
            for path in &written {
                remove_quietly(path);
            }
            record.content_type = previous;
            Err(ProcessingError::Write(e))
        }
    }
}

fn write_all(
    backend: &impl ImageBackend,
    record: &mut ImageRecord,
    dir: &Path,
    variants: &[(&String, FrameSet)],
    quality: Quality,
    written: &mut Vec<PathBuf>,
) -> Result<(), BackendError> {
    fs::create_dir_all(dir)?;
    for (name, _) in variants {
        for ext in ContentType::EXTENSIONS {
            remove_quietly(&dir.join(variant_filename(name, ext)));
        }
    }

    for (name, frames) in variants {
        let (content_type, output) = write_variant(backend, frames, dir, name, quality)?;
        debug!(path = %output.display(), content_type = %content_type, "wrote variant");
        written.push(output);
        record.content_type = Some(content_type);
    }
    Ok(())
}

/// Remove every variant file of `record`, then its directory if it is empty.
///
/// Best effort: missing files and I/O errors are logged and skipped.
/// Returns the files that were removed.
pub fn delete_variant_files(record: &ImageRecord, config: &StoreConfig) -> Vec<PathBuf> {
    let Some(dir) = record
        .identifier()
        .and_then(|id| record_dir(record.save_root(config), id))
    else {
        debug!("record has no identifier, nothing to delete");
        return Vec::new();
    };

    let mut removed = Vec::new();
    for name in record.sizes(config).names() {
        for ext in ContentType::EXTENSIONS {
            let path = dir.join(variant_filename(name, ext));
            if remove_quietly(&path) {
                removed.push(path);
            }
        }
    }

    if let Err(e) = fs::remove_dir(&dir) {
        debug!(dir = %dir.display(), error = %e, "record directory kept");
    }
    info!(dir = %dir.display(), files = removed.len(), "deleted variants");
    removed
}

/// Remove a file, treating "not found" as success. Returns whether a file
/// was actually removed.
fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not remove file");
            false
        }
    }
}
