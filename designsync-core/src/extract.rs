//! Extraction of design documents from raw `_all_docs` query rows.
//!
//! CouchDB returns rows shaped like:
//!
//! ```json
//! { "id": "_design/doc1", "key": "_design/doc1",
//!   "value": { "rev": "1-abc" },
//!   "doc": { "_id": "_design/doc1", "_rev": "1-abc", "views": { } } }
//! ```
//!
//! Any row that breaks this shape is a hard parse failure, never skipped.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::{DesignDocument, DESIGN_PREFIX};
use crate::error::DocumentError;

/// Mapping from document id to design document.
///
/// A `BTreeMap` keeps iteration order deterministic, which in turn keeps the
/// diff's output order deterministic for a given input.
pub type DocumentSet = BTreeMap<String, DesignDocument>;

/// Extract design documents from raw query rows, indexed by id.
///
/// Validation order per row: `key` string, `_design/` prefix, `value` object,
/// `value.rev` string, `doc` object. Duplicate ids overwrite earlier entries.
pub fn extract(rows: &[Value]) -> Result<DocumentSet, DocumentError> {
    let mut documents = DocumentSet::new();
    for row in rows {
        let key = row
            .get("key")
            .and_then(Value::as_str)
            .ok_or(DocumentError::RowMissingKey)?;
        if !key.starts_with(DESIGN_PREFIX) {
            return Err(DocumentError::KeyNotDesign {
                key: key.to_owned(),
            });
        }
        let value = row
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| DocumentError::RowMissingValue {
                key: key.to_owned(),
            })?;
        let revision = value
            .get("rev")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::RowMissingRevision {
                key: key.to_owned(),
            })?;
        let doc = row
            .get("doc")
            .and_then(Value::as_object)
            .ok_or_else(|| DocumentError::RowMissingDoc {
                key: key.to_owned(),
            })?;

        let document = DesignDocument::from_row_parts(key, revision, doc.clone());
        documents.insert(document.id().to_owned(), document);
    }
    Ok(documents)
}

/// Extract `(id, revision)` pairs from doc-less listing rows.
///
/// Used by the purge path, which queries without `include_docs` and only
/// needs enough to address each document for deletion. No prefix check: purge
/// covers every document, not just design documents.
pub fn extract_revisions(rows: &[Value]) -> Result<Vec<(String, String)>, DocumentError> {
    let mut pairs = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row
            .get("id")
            .and_then(Value::as_str)
            .ok_or(DocumentError::RowMissingId)?;
        let value = row
            .get("value")
            .and_then(Value::as_object)
            .ok_or_else(|| DocumentError::RowMissingValue { key: id.to_owned() })?;
        let revision = value
            .get("rev")
            .and_then(Value::as_str)
            .ok_or_else(|| DocumentError::RowMissingRevision { key: id.to_owned() })?;
        pairs.push((id.to_owned(), revision.to_owned()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(id: &str, rev: &str, body: Value) -> Value {
        json!({"id": id, "key": id, "value": {"rev": rev}, "doc": body})
    }

    #[test]
    fn extracts_one_document_per_row() {
        let rows = vec![
            row(
                "_design/doc1",
                "1-abc",
                json!({"_id": "_design/doc1", "_rev": "1-abc", "prop": "v1"}),
            ),
            row(
                "_design/doc2",
                "4-def",
                json!({"_id": "_design/doc2", "_rev": "4-def", "prop": "v2"}),
            ),
        ];
        let documents = extract(&rows).expect("extract");
        assert_eq!(documents.len(), 2);

        let doc2 = &documents["_design/doc2"];
        assert_eq!(doc2.id(), "_design/doc2");
        assert_eq!(doc2.revision(), Some("4-def"));
        assert_eq!(doc2.body()["prop"], json!("v2"));
    }

    #[test]
    fn duplicate_ids_last_writer_wins() {
        let rows = vec![
            row(
                "_design/doc1",
                "1-abc",
                json!({"_id": "_design/doc1", "prop": "old"}),
            ),
            row(
                "_design/doc1",
                "2-def",
                json!({"_id": "_design/doc1", "prop": "new"}),
            ),
        ];
        let documents = extract(&rows).expect("extract");
        assert_eq!(documents.len(), 1);
        assert_eq!(documents["_design/doc1"].revision(), Some("2-def"));
        assert_eq!(documents["_design/doc1"].body()["prop"], json!("new"));
    }

    #[test]
    fn rejects_row_without_key() {
        let rows = vec![json!({"value": {"rev": "1-abc"}, "doc": {}})];
        let err = extract(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::RowMissingKey));
    }

    #[test]
    fn rejects_key_without_design_prefix() {
        let rows = vec![row("plain-doc", "1-abc", json!({"_id": "plain-doc"}))];
        let err = extract(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::KeyNotDesign { key } if key == "plain-doc"));
    }

    #[test]
    fn rejects_row_without_value() {
        let rows = vec![json!({"key": "_design/doc1", "doc": {}})];
        let err = extract(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::RowMissingValue { .. }));
    }

    #[test]
    fn rejects_value_without_rev() {
        let rows = vec![json!({"key": "_design/doc1", "value": {}, "doc": {}})];
        let err = extract(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::RowMissingRevision { .. }));
    }

    #[test]
    fn rejects_row_without_doc() {
        let rows = vec![json!({"key": "_design/doc1", "value": {"rev": "1-abc"}})];
        let err = extract(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::RowMissingDoc { key } if key == "_design/doc1"));
    }

    #[test]
    fn empty_input_yields_empty_set() {
        assert!(extract(&[]).expect("extract").is_empty());
    }

    #[test]
    fn extract_revisions_reads_id_rev_pairs() {
        let rows = vec![
            json!({"id": "doc1", "key": "doc1", "value": {"rev": "1-abc"}}),
            json!({"id": "_design/doc2", "key": "_design/doc2", "value": {"rev": "7-def"}}),
        ];
        let pairs = extract_revisions(&rows).expect("extract_revisions");
        assert_eq!(
            pairs,
            vec![
                ("doc1".to_owned(), "1-abc".to_owned()),
                ("_design/doc2".to_owned(), "7-def".to_owned()),
            ]
        );
    }

    #[test]
    fn extract_revisions_rejects_row_without_id() {
        let rows = vec![json!({"value": {"rev": "1-abc"}})];
        let err = extract_revisions(&rows).unwrap_err();
        assert!(matches!(err, DocumentError::RowMissingId));
    }
}
