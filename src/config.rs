//! Store configuration.
//!
//! Handles loading, validating, and merging `hashpix.toml`. Stock defaults are
//! overridden by whatever the user's file sets; everything is optional.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! save_path = "public/images/uploads"  # Where variant files are written
//! read_path = "images/uploads"         # Public prefix used in URLs
//!
//! [images]
//! quality = 85              # JPEG quality (1-100)
//!
//! [sizes]                   # name = geometry, or [geometry, "scale" | "crop"]
//! large = ">800x600"
//! medium = ">640x480"
//! small = ">320x240"
//!
//! [processing]
//! max_threads = 4           # Max parallel resize workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. The one
//! exception is `[sizes]`: a file that declares it replaces the whole table,
//! so sizes can be removed as well as added.
//!
//! Unknown keys are rejected to catch typos early.

use crate::sizes::{SizeSpec, SizeTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "hashpix.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Store configuration loaded from `hashpix.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Filesystem root under which record directories are created.
    pub save_path: PathBuf,
    /// Public path prefix used to build URLs.
    pub read_path: String,
    /// Encoding settings.
    pub images: ImagesConfig,
    /// Named output sizes, in the order they are processed.
    pub sizes: SizeTable,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("public/images/uploads"),
            read_path: "images/uploads".to_string(),
            images: ImagesConfig::default(),
            sizes: default_sizes(),
            processing: ProcessingConfig::default(),
        }
    }
}

fn default_sizes() -> SizeTable {
    [
        ("large", ">800x600"),
        ("medium", ">640x480"),
        ("small", ">320x240"),
    ]
    .into_iter()
    .filter_map(|(name, geometry)| Some((name, SizeSpec::scale(geometry.parse().ok()?))))
    .collect()
}

impl StoreConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.quality == 0 || self.images.quality > 100 {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.save_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("save_path must not be empty".into()));
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::Validation("sizes must not be empty".into()));
        }
        validate_size_names(&self.sizes)
    }
}

/// Size names become file names, so they must be plain path components.
pub fn validate_size_names(sizes: &SizeTable) -> Result<(), ConfigError> {
    for name in sizes.names() {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0'])
        {
            return Err(ConfigError::Validation(format!(
                "size name {name:?} is not a valid file name"
            )));
        }
    }
    Ok(())
}

/// Encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 85 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel resize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(StoreConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
///
/// A `[sizes]` table in the overlay replaces the base table instead of being
/// merged into it.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<StoreConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            let mut base = base;
            if let (toml::Value::Table(base_table), Some(_)) = (&mut base, ov.get("sizes")) {
                base_table.remove("sizes");
            }
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: StoreConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, falling back to stock defaults when it is absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<StoreConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `hashpix.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# hashpix configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Filesystem directory under which images are written. Each image gets its
# own directory derived from its identifier: <save_path>/3/f/a9c0.../large.jpg
save_path = "public/images/uploads"

# Public path prefix used when building URLs: /<read_path>/3/f/a9c0.../large.jpg
read_path = "images/uploads"

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[images]
# JPEG quality (1 = worst, 100 = best). Animated images are stored as GIF.
quality = 85

# ---------------------------------------------------------------------------
# Sizes
# ---------------------------------------------------------------------------
# One file is written per size; the name becomes the file name.
# Declaring this table replaces the default sizes entirely.
#
# Geometry:  800x600 (fit)   800x600! (exact)   >800x600 (shrink only)
#            <800x600 (enlarge only)   800x600^ (cover)   50% (percent)
#            800 (width only)   x600 (height only)   10000@ (max area)
#
# Policy:    "scale" (default) resizes to the geometry.
#            "crop" covers the geometry, then clips from the top-left corner.
#
#   thumb = ["100x100", "crop"]
#   banner = { geometry = "1200x300", policy = "crop" }
[sizes]
large = ">800x600"
medium = ">640x480"
small = ">320x240"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel resize workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizes::ResizePolicy;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    fn size_names(config: &StoreConfig) -> Vec<&str> {
        config.sizes.names().collect()
    }

    #[test]
    fn default_config_values() {
        let config = StoreConfig::default();
        assert_eq!(config.save_path, PathBuf::from("public/images/uploads"));
        assert_eq!(config.read_path, "images/uploads");
        assert_eq!(config.images.quality, 85);
        assert_eq!(size_names(&config), vec!["large", "medium", "small"]);
        assert_eq!(config.processing.max_threads, None);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn load_config_partial_override() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
read_path = "media"

[images]
quality = 70
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.read_path, "media");
        assert_eq!(config.images.quality, 70);
        // untouched values keep their defaults
        assert_eq!(config.save_path, PathBuf::from("public/images/uploads"));
        assert_eq!(size_names(&config), vec!["large", "medium", "small"]);
    }

    #[test]
    fn sizes_table_replaces_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[sizes]
foo = "100x100!"
bar = ["<50x50", "crop"]
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(size_names(&config), vec!["foo", "bar"]);
        assert_eq!(config.sizes.get("bar").unwrap().policy, ResizePolicy::Crop);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "this is not [valid toml");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "save_pth = \"typo\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[images]\nqualty = 50\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn bad_geometry_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "[sizes]\nhuge = \"enormous\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = StoreConfig::default();
        config.images.quality = 100;
        assert!(config.validate().is_ok());
        config.images.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.images.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_sizes_empty() {
        let config = StoreConfig {
            sizes: SizeTable::new(),
            ..StoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_size_names_rejects_paths() {
        for bad in ["../escape", "a/b", ".hidden", ""] {
            let mut sizes = SizeTable::new();
            sizes.insert(bad, SizeSpec::scale("10x10".parse().unwrap()));
            assert!(validate_size_names(&sizes).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_threads: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_threads: Some(cores * 4),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(1));
        assert_eq!(merged.get("b").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 5").unwrap();
        let merged = merge_toml(base, overlay);
        let t = merged.get("t").unwrap();
        assert_eq!(t.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(t.get("y").unwrap().as_integer(), Some(5));
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value().unwrap();
        assert!(value.is_table());
        assert!(value.get("sizes").is_some());
        assert!(value.get("images").is_some());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: StoreConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        assert!(content.contains("[images]"));
        assert!(content.contains("[sizes]"));
        assert!(content.contains("[processing]"));
    }
}
