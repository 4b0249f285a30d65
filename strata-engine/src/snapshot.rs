//! Durable snapshot persistence.
//!
//! Each collection persists as one JSON file holding the full map from
//! document id to document. Writes go through a temp file in the same
//! directory followed by a rename, so a reader never observes a torn file.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tempfile::NamedTempFile;

use strata_core::document::Document;
use strata_core::error::{StoreError, StoreResult};

/// Writes the full document set to the snapshot file, replacing prior contents.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] if the file cannot be written or
/// renamed into place, or [`StoreError::Serialization`] if encoding fails.
pub fn write(path: &Path, documents: &HashMap<String, Document>) -> StoreResult<()> {
    let dir = path.parent().ok_or_else(|| {
        StoreError::Persistence(format!("snapshot path {} has no parent directory", path.display()))
    })?;

    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut file, documents)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .map_err(|err| StoreError::Persistence(err.to_string()))?;

    Ok(())
}

/// Reads a snapshot file back into a document map.
///
/// A missing file and a zero-byte file both yield an empty document set.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] on I/O failure or
/// [`StoreError::Serialization`] if the contents do not decode.
pub fn read(path: &Path) -> StoreResult<HashMap<String, Document>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(err) => return Err(err.into()),
    };

    if bytes.is_empty() {
        return Ok(HashMap::new());
    }

    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn round_trip_restores_the_document_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.json");

        let mut documents = HashMap::new();
        documents.insert(
            "p1".to_string(),
            Document::new("p1", json!({ "name": "Widget", "price": 9.99 })),
        );
        documents.insert(
            "p2".to_string(),
            Document::new("p2", json!({ "name": "Gadget", "price": 19.99 })),
        );

        write(&path, &documents).unwrap();
        let restored = read(&path).unwrap();

        assert_eq!(restored, documents);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let restored = read(&dir.path().join("absent.json")).unwrap();

        assert!(restored.is_empty());
    }

    #[test]
    fn zero_byte_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.json");
        fs::write(&path, b"").unwrap();

        assert!(read(&path).unwrap().is_empty());
    }

    #[test]
    fn write_replaces_prior_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("products.json");

        let mut documents = HashMap::new();
        documents.insert("p1".to_string(), Document::new("p1", json!({ "a": 1 })));
        write(&path, &documents).unwrap();

        documents.remove("p1");
        documents.insert("p2".to_string(), Document::new("p2", json!({ "b": 2 })));
        write(&path, &documents).unwrap();

        let restored = read(&path).unwrap();
        assert!(!restored.contains_key("p1"));
        assert!(restored.contains_key("p2"));
    }
}
