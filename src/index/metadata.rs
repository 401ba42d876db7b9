//! Identifier index: source URL → Open Images ImageID
//!
//! Built once from the metadata table and read-only afterwards.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{MapperError, Result};

/// Names and delimiter of the metadata table columns we need
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataColumns {
    pub url: String,
    pub id: String,
    pub delimiter: u8,
}

impl Default for MetadataColumns {
    fn default() -> Self {
        Self {
            url: "OriginalURL".to_string(),
            id: "ImageID".to_string(),
            delimiter: b',',
        }
    }
}

/// Mapping from original source URL to canonical image identifier
#[derive(Debug, Default, Clone)]
pub struct IdentifierIndex {
    url_to_id: HashMap<String, String>,
}

impl IdentifierIndex {
    /// Read the metadata table at `path`
    pub fn from_path(path: &Path, columns: &MetadataColumns) -> Result<Self> {
        let file = File::open(path).map_err(|e| MapperError::io(path, e))?;
        Self::from_reader(file, columns).map_err(|err| match err {
            MapperError::MissingColumn { column, .. } => MapperError::MissingColumn {
                path: Some(path.to_path_buf()),
                column,
            },
            other => other,
        })
    }

    /// Read a metadata table from any byte stream.
    ///
    /// Both cells are trimmed. Blank URLs are inserted like any other, and a
    /// URL seen twice keeps whichever ImageID was read last. Short rows count
    /// their missing cells as empty; only a missing header column is an error.
    pub fn from_reader<R: Read>(reader: R, columns: &MetadataColumns) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(columns.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.byte_headers()?.clone();
        let url_idx = column_index(&headers, &columns.url)?;
        let id_idx = column_index(&headers, &columns.id)?;

        let mut url_to_id = HashMap::new();
        let mut row = csv::ByteRecord::new();
        while csv_reader.read_byte_record(&mut row)? {
            let url = cell(&row, url_idx);
            let id = cell(&row, id_idx);
            url_to_id.insert(url, id);
        }

        Ok(Self { url_to_id })
    }

    /// ImageID recorded for `url`, if any
    pub fn get(&self, url: &str) -> Option<&str> {
        self.url_to_id.get(url).map(String::as_str)
    }

    pub fn insert(&mut self, url: impl Into<String>, id: impl Into<String>) {
        self.url_to_id.insert(url.into(), id.into());
    }

    pub fn len(&self) -> usize {
        self.url_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.url_to_id.is_empty()
    }
}

fn column_index(headers: &csv::ByteRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name.as_bytes())
        .ok_or_else(|| MapperError::MissingColumn {
            path: None,
            column: name.to_string(),
        })
}

fn cell(row: &csv::ByteRecord, idx: usize) -> String {
    row.get(idx)
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(table: &str) -> Result<IdentifierIndex> {
        IdentifierIndex::from_reader(table.as_bytes(), &MetadataColumns::default())
    }

    #[test]
    fn test_maps_url_to_id() {
        let index = build(
            "ImageID,Subset,OriginalURL,Rotation\n\
             id1,train,http://a/1.jpg,0.0\n\
             id2,train,http://a/2.jpg,90.0\n",
        )
        .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("http://a/1.jpg"), Some("id1"));
        assert_eq!(index.get("http://a/2.jpg"), Some("id2"));
        assert_eq!(index.get("http://a/3.jpg"), None);
    }

    #[test]
    fn test_trims_values() {
        let index = build("OriginalURL,ImageID\n  http://a/1.jpg \t,  id1  \n").unwrap();
        assert_eq!(index.get("http://a/1.jpg"), Some("id1"));
    }

    #[test]
    fn test_duplicate_url_last_read_wins() {
        let index = build("OriginalURL,ImageID\nhttp://a/1.jpg,first\nhttp://a/1.jpg,second\n").unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get("http://a/1.jpg"), Some("second"));
    }

    #[test]
    fn test_blank_url_is_still_inserted() {
        let index = build("OriginalURL,ImageID\n   ,orphan\n").unwrap();
        assert_eq!(index.get(""), Some("orphan"));
    }

    #[test]
    fn test_short_row_is_not_an_error() {
        let index = build("OriginalURL,ImageID\nhttp://a/1.jpg\nhttp://a/2.jpg,id2\n").unwrap();

        assert_eq!(index.get("http://a/1.jpg"), Some(""));
        assert_eq!(index.get("http://a/2.jpg"), Some("id2"));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let err = build("ImageID,Subset\nid1,train\n").unwrap_err();
        match err {
            MapperError::MissingColumn { path, column } => {
                assert_eq!(column, "OriginalURL");
                assert_eq!(path, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            build("ImageID,Subset\nid1,train\n").unwrap_err().to_string(),
            "metadata table has no `OriginalURL` column"
        );
    }

    #[test]
    fn test_header_names_match_exactly() {
        let err = build(" OriginalURL ,ImageID\nhttp://a/1.jpg,id1\n").unwrap_err();
        assert!(matches!(err, MapperError::MissingColumn { column, .. } if column == "OriginalURL"));

        let err = build("originalurl,ImageID\nhttp://a/1.jpg,id1\n").unwrap_err();
        assert!(matches!(err, MapperError::MissingColumn { .. }));
    }

    #[test]
    fn test_custom_columns_and_delimiter() {
        let columns = MetadataColumns {
            url: "url".to_string(),
            id: "id".to_string(),
            delimiter: b'\t',
        };
        let index = IdentifierIndex::from_reader("id\turl\nabc\thttp://x/y.jpg\n".as_bytes(), &columns).unwrap();
        assert_eq!(index.get("http://x/y.jpg"), Some("abc"));
    }

    #[test]
    fn test_from_path_reports_file_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.csv");
        std::fs::write(&path, "OriginalURL\nhttp://a/1.jpg\n").unwrap();

        match IdentifierIndex::from_path(&path, &MetadataColumns::default()).unwrap_err() {
            MapperError::MissingColumn { path: reported, column } => {
                assert_eq!(reported, Some(path));
                assert_eq!(column, "ImageID");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = IdentifierIndex::from_path(Path::new("/nonexistent/meta.csv"), &MetadataColumns::default())
            .unwrap_err();
        assert!(matches!(err, MapperError::Io { .. }));
    }
}
