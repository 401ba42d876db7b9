//! Lookup tables built before any record is resolved
//!
//! - `metadata.rs` - source URL → ImageID, from the Open Images metadata table
//! - `local.rs` - ImageID → file path, from a scan of the local mirror
//!
//! Both are built once per run and are read-only afterwards.

pub mod local;
pub mod metadata;

pub use local::LocalPathIndex;
pub use metadata::{IdentifierIndex, MetadataColumns};
