//! The design-document model.
//!
//! A [`DesignDocument`] wraps one CouchDB design document body. Content
//! equality deliberately ignores `_rev`: a freshly assembled document and its
//! persisted twin compare equal even though only the latter carries a
//! revision.

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// Id prefix that marks a document as a design document.
pub const DESIGN_PREFIX: &str = "_design/";

const ID_MEMBER: &str = "_id";
const REV_MEMBER: &str = "_rev";

/// One design document: identity, optional revision, full JSON body.
///
/// Immutable after construction; [`DesignDocument::copy_with_revision`] is
/// the only derivation and never mutates the receiver.
#[derive(Debug, Clone)]
pub struct DesignDocument {
    id: String,
    revision: Option<String>,
    body: Map<String, Value>,
}

impl DesignDocument {
    /// Build a document from a raw JSON value (file-system origin).
    ///
    /// The value must be an object with a string `_id`; `_rev` is optional
    /// and, when present, becomes the document's revision.
    pub fn from_json(json: Value) -> Result<Self, DocumentError> {
        let Value::Object(body) = json else {
            return Err(DocumentError::NotAnObject);
        };
        let id = body
            .get(ID_MEMBER)
            .and_then(Value::as_str)
            .ok_or(DocumentError::MissingId)?
            .to_owned();
        let revision = body
            .get(REV_MEMBER)
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(Self { id, revision, body })
    }

    /// Build a document from pre-validated row parts (database origin).
    ///
    /// Used by the extractor, which has already checked id and revision; the
    /// body is taken as-is.
    pub(crate) fn from_row_parts(id: &str, revision: &str, body: Map<String, Value>) -> Self {
        Self {
            id: id.to_owned(),
            revision: Some(revision.to_owned()),
            body,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    /// True iff the document has never been persisted (no revision).
    pub fn is_new(&self) -> bool {
        self.revision.is_none()
    }

    /// The full JSON body, including `_id` and, if persisted, `_rev`.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The body as a JSON value, suitable for a bulk-write payload.
    pub fn to_json(&self) -> Value {
        Value::Object(self.body.clone())
    }

    /// Derive a new document with `_rev` set to `revision`.
    ///
    /// The body is a full copy; `self` is left untouched. Content equality
    /// with `self` is preserved since equality ignores the revision.
    pub fn copy_with_revision(&self, revision: &str) -> DesignDocument {
        let mut body = self.body.clone();
        body.insert(REV_MEMBER.to_owned(), Value::String(revision.to_owned()));
        DesignDocument {
            id: self.id.clone(),
            revision: Some(revision.to_owned()),
            body,
        }
    }
}

/// Content equality: structural comparison of the two bodies with the
/// top-level `_rev` member excluded from both sides.
impl PartialEq for DesignDocument {
    fn eq(&self, other: &Self) -> bool {
        bodies_equal_ignoring_revision(&self.body, &other.body)
    }
}

impl Eq for DesignDocument {}

fn bodies_equal_ignoring_revision(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    let len = |m: &Map<String, Value>| m.iter().filter(|(k, _)| *k != REV_MEMBER).count();
    if len(a) != len(b) {
        return false;
    }
    a.iter()
        .filter(|(key, _)| *key != REV_MEMBER)
        .all(|(key, value)| b.get(key) == Some(value))
}
