//! Open Images URL → local file mapper
//!
//! Joins a JSONL dataset that cites images by source URL against the Open
//! Images metadata table and a local mirror of the images:
//! - `index` - URL → ImageID and ImageID → path lookup tables
//! - `resolve` - per-record classification and outcome counters
//! - `pipeline` - the two build phases and the streaming pass
//! - `config` - fixed run configuration
//! - `error` - fatal error taxonomy

pub mod config;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod resolve;

pub use config::MapperConfig;
pub use error::{MapperError, Result};
pub use pipeline::{run, RunSummary};
pub use resolve::{Outcome, PassStats, Resolver};
