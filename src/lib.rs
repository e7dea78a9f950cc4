//! # hashpix
//!
//! Image upload storage for record-backed applications. When a record is
//! validated, hashpix decodes the uploaded image, derives one resized variant
//! per configured size, and writes them into a directory derived from the
//! record's identifier. When the record is deleted, the variants go with it.
//!
//! # Lifecycle
//!
//! ```text
//! validate    allocate identifier → decode → resize per size → write (or roll back)
//! render      identifier + size → /images/uploads/3/f/a9c0.../large.jpg
//! destroy     remove every {size}.jpg / {size}.gif, then the empty record dir
//! ```
//!
//! The host application owns persistence. It stores three columns per record
//! (`hash_string`, `content_type`, `original_filename`) and answers one
//! question through [`IdentifierIndex`]: is this identifier taken?
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | [`ImageStore`] facade: validate, save, destroy, URLs |
//! | [`hashpath`] | Identifier allocation and the `a/b/rest` path layout |
//! | [`process`] | Decode, resize, write with rollback, delete |
//! | [`imaging`] | Geometry grammar, dimension math, the `image`-crate backend |
//! | [`sizes`] | Named size table and the scale/crop policy |
//! | [`record`] | The record, upload and validation-error types |
//! | [`config`] | `hashpix.toml` loading, merging, and validation |
//! | [`inventory`] | Walks a save root and lists stored records |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Hashed Fan-Out
//!
//! Identifiers are 32 hex characters. The first two characters become two
//! directory levels, so the tree never puts more than 16 entries in either
//! of the upper levels regardless of how many images are stored.
//!
//! ## JPEG or GIF, Nothing Else
//!
//! Every still image is re-encoded as JPEG whatever its input format. Input
//! with more than one frame keeps its animation and is stored as a looping
//! GIF. The record's content type follows the last size written.
//!
//! ## All or Nothing
//!
//! Resizing happens entirely in memory before anything touches the disk. If
//! a write fails part-way, every file written during that attempt is removed
//! again and the record keeps its previous content type.

pub mod config;
pub mod hashpath;
pub mod imaging;
pub mod inventory;
pub mod output;
pub mod process;
pub mod record;
pub mod sizes;
pub mod store;

pub use config::StoreConfig;
pub use hashpath::{DirectoryIndex, IdentifierIndex, IndexError, MemoryIndex, ensure_identifier};
pub use imaging::{ContentType, ImageBackend, RustBackend};
pub use process::ProcessingError;
pub use record::{FILE_FIELD, ImageRecord, Upload, ValidationErrors};
pub use sizes::{ResizePolicy, SizeSpec, SizeTable};
pub use store::{ImageStore, SavedRecord};

#[cfg(test)]
pub(crate) mod test_helpers;
