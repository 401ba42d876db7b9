//! Per-record resolution: URL → ImageID → local file
//!
//! Every record ends up in exactly one [`Outcome`] class and gets exactly one
//! new field: the local path when matched, `null` otherwise. Nothing in here
//! can fail.

pub mod stats;

pub use stats::PassStats;

use serde_json::{Map, Value};
use std::path::Path;

use crate::index::{IdentifierIndex, LocalPathIndex};

/// Which link of the URL → ID → file chain held up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// URL known, ImageID known, file present on disk
    Matched,
    /// URL missing from the record or unknown to the metadata table
    UrlUnresolved,
    /// ImageID known but no local file (never indexed, or gone since the scan)
    FileMissing,
}

/// Outcome of one record, with the path that was written when matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub outcome: Outcome,
    pub local_path: Option<&'a Path>,
}

impl<'a> Resolution<'a> {
    fn unresolved() -> Self {
        Self { outcome: Outcome::UrlUnresolved, local_path: None }
    }

    fn missing() -> Self {
        Self { outcome: Outcome::FileMissing, local_path: None }
    }

    fn matched(path: &'a Path) -> Self {
        Self { outcome: Outcome::Matched, local_path: Some(path) }
    }
}

/// Existence check for indexed paths
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Asks the filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskProbe;

impl FileProbe for DiskProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Resolves records against both indexes
pub struct Resolver<'a, P = DiskProbe> {
    ids: &'a IdentifierIndex,
    paths: &'a LocalPathIndex,
    probe: P,
    url_field: String,
    path_field: String,
}

impl<'a> Resolver<'a, DiskProbe> {
    pub fn new(
        ids: &'a IdentifierIndex,
        paths: &'a LocalPathIndex,
        url_field: impl Into<String>,
        path_field: impl Into<String>,
    ) -> Self {
        Self::with_probe(ids, paths, url_field, path_field, DiskProbe)
    }
}

impl<'a, P: FileProbe> Resolver<'a, P> {
    pub fn with_probe(
        ids: &'a IdentifierIndex,
        paths: &'a LocalPathIndex,
        url_field: impl Into<String>,
        path_field: impl Into<String>,
        probe: P,
    ) -> Self {
        Self {
            ids,
            paths,
            probe,
            url_field: url_field.into(),
            path_field: path_field.into(),
        }
    }

    /// Classify `record` without touching it
    pub fn classify(&self, record: &Map<String, Value>) -> Resolution<'a> {
        let paths: &'a LocalPathIndex = self.paths;

        // Step 1: the record must carry a usable URL
        let url = match record.get(&self.url_field) {
            Some(value) if is_truthy(value) => value,
            _ => return Resolution::unresolved(),
        };

        // Step 2: URL → ImageID. A truthy non-string can never be a key.
        let image_id = match url.as_str().and_then(|url| self.ids.get(url)) {
            Some(id) if !id.is_empty() => id,
            _ => return Resolution::unresolved(),
        };

        // Step 3: ImageID → indexed path
        let Some(path) = paths.get(image_id) else {
            tracing::trace!("ImageID {} has no local file", image_id);
            return Resolution::missing();
        };

        // Step 4: the file may have disappeared since the scan
        if !self.probe.exists(path) {
            tracing::trace!("Indexed file is gone: {}", path.display());
            return Resolution::missing();
        }

        Resolution::matched(path)
    }

    /// Classify `record` and write the path field (a string, or null)
    pub fn resolve(&self, record: &mut Map<String, Value>) -> Outcome {
        let resolution = self.classify(record);
        let value = match resolution.local_path {
            Some(path) => Value::String(path.to_string_lossy().into_owned()),
            None => Value::Null,
        };
        record.insert(self.path_field.clone(), value);
        resolution.outcome
    }
}

/// JSON falsiness: null, false, zero, and empty strings, arrays, and objects
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        // Numbers keep their source text, so "0", "-0" and "0e10" all land here as zero
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
