//! Embedded relational storage for projects, chunks and file-hash
//! watermarks, built on pooled SQLite connections in WAL mode.

pub mod encoding;
pub mod error;
pub mod store;

pub use error::{StoreError, CURRENT_SCHEMA_VERSION};
pub use store::{content_hash_of, Storage};
