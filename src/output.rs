//! CLI output formatting.
//!
//! # Entity Display Contract
//!
//! Every command leads with the record identifier, with details shown as
//! indented context lines underneath. File paths are displayed relative to
//! the save root.
//!
//! ## put
//!
//! ```text
//! 3fa9c0e1d2b4... image/jpeg
//!     Original: cat.png
//!     large: 3/f/a9c0e1d2b4.../large.jpg
//!     small: 3/f/a9c0e1d2b4.../small.jpg
//! ```
//!
//! ## list
//!
//! ```text
//! 001 3fa9c0e1d2b4...
//!     large.jpg, medium.jpg, small.jpg
//! 002 7b01ee...
//!     (empty)
//!
//! 2 records
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::StoreConfig;
use crate::inventory::StoredRecord;
use crate::record::ValidationErrors;
use crate::store::SavedRecord;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `path` relative to `root` with forward slashes, or as given when it is
/// not under `root`.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// put / delete
// ============================================================================

/// Format the result of a save.
pub fn format_saved(saved: &SavedRecord, save_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    match saved.content_type {
        Some(ct) => lines.push(format!("{} {}", saved.identifier, ct)),
        None => lines.push(saved.identifier.clone()),
    }
    if let Some(name) = &saved.original_filename {
        lines.push(format!("{}Original: {}", indent(1), name));
    }
    for path in &saved.variants {
        let size = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            size,
            display_path(path, save_root)
        ));
    }
    lines
}

pub fn print_saved(saved: &SavedRecord, save_root: &Path) {
    for line in format_saved(saved, save_root) {
        println!("{}", line);
    }
}

/// Format the files removed for one identifier.
pub fn format_deleted(
    identifier: &str,
    removed: &[impl AsRef<Path>],
    save_root: &Path,
) -> Vec<String> {
    let mut lines = vec![format!("{} deleted {} files", identifier, removed.len())];
    lines.extend(
        removed
            .iter()
            .map(|p| format!("{}{}", indent(1), display_path(p.as_ref(), save_root))),
    );
    lines
}

pub fn print_deleted(identifier: &str, removed: &[impl AsRef<Path>], save_root: &Path) {
    for line in format_deleted(identifier, removed, save_root) {
        println!("{}", line);
    }
}

/// Format field errors, one `field: message` per line.
pub fn format_errors(errors: &ValidationErrors) -> Vec<String> {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect()
}

// ============================================================================
// list
// ============================================================================

/// Format a store listing.
pub fn format_listing(records: &[StoredRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), record.identifier));
        if record.files.is_empty() {
            lines.push(format!("{}(empty)", indent(1)));
        } else {
            lines.push(format!("{}{}", indent(1), record.files.join(", ")));
        }
    }
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(match records.len() {
        1 => "1 record".to_string(),
        n => format!("{} records", n),
    });
    lines
}

pub fn print_listing(records: &[StoredRecord]) {
    for line in format_listing(records) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

/// Format a summary of a validated configuration.
pub fn format_config_summary(config: &StoreConfig) -> Vec<String> {
    let mut lines = vec![
        "Config OK".to_string(),
        format!("{}Save path: {}", indent(1), config.save_path.display()),
        format!("{}Read path: {}", indent(1), config.read_path),
        format!("{}Quality: {}", indent(1), config.images.quality),
        format!("{}Sizes:", indent(1)),
    ];
    for (name, spec) in config.sizes.entries() {
        lines.push(format!(
            "{}{}: {} ({})",
            indent(2),
            name,
            spec.geometry,
            spec.policy.as_str()
        ));
    }
    lines
}

pub fn print_config_summary(config: &StoreConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}
