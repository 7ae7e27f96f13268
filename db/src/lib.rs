//! File handling for lore schemas and content.
//!
//! This crate wraps [`lore_schema_core`] with the I/O a lore tool needs:
//! reading schema YAML into a resolved [`Schema`](lore_schema_core::Schema),
//! saving it back atomically, finding content files on disk, and binding
//! content documents to schema definitions so they can be validated.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::PathBuf;
//! use lore_schema_core::validate;
//! use lore_schema_db::{ContentDocument, SchemaStore, bind_content, collect_content_paths};
//!
//! let store = SchemaStore::load("world/schema.yaml").unwrap();
//! let paths = collect_content_paths(&[PathBuf::from("world/lore")], store.settings()).unwrap();
//!
//! for path in paths {
//!     let doc = ContentDocument::load(&path).unwrap();
//!     let roots = bind_content(store.schema(), store.settings(), &doc).unwrap();
//!     let result = validate(store.schema(), store.settings(), &roots);
//!     println!("{}: {}", path.display(), result.worst());
//! }
//! ```

mod content;
mod error;
mod loader;
mod paths;

pub use content::{
    ContentAttribute, ContentCollection, ContentDocument, ContentFormat, ContentNode,
    ContentSection, ContentValue, bind_content,
};
pub use error::{Result, StoreError};
pub use loader::{SchemaStore, write_atomic};
pub use paths::collect_content_paths;
