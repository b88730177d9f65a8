//! File-system document assembler.
//!
//! # Directory layout
//!
//! Each top-level directory under the base directory becomes one design
//! document named `_design/<directory>`:
//!
//! ```text
//! <base>/
//!   doc1/                      →  _design/doc1
//!     language.txt             →  "language": "<file content>"
//!     views/                   →  "views": { ... }
//!       by_name/
//!         map.js               →  "views": { "by_name": { "map": "<js>" } }
//!     options.json             →  "options": <parsed JSON>
//! ```
//!
//! Nested directories become nested objects; `.json` files are parsed as JSON
//! values; every other file becomes a string keyed by its file stem. Hidden
//! entries (leading dot) are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use designsync_core::{DesignDocument, DocumentSet, DESIGN_PREFIX};
use designsync_engine::error::io_err;
use designsync_engine::{DocumentAssembler, EngineError};

/// Assembles design documents from a directory tree.
pub struct FsAssembler {
    base: PathBuf,
}

impl FsAssembler {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl DocumentAssembler for FsAssembler {
    fn assemble(&self) -> Result<DocumentSet, EngineError> {
        let mut documents = DocumentSet::new();
        for entry in fs::read_dir(&self.base).map_err(|e| io_err(&self.base, e))? {
            let entry = entry.map_err(|e| io_err(&self.base, e))?;
            let path = entry.path();
            if !path.is_dir() || is_hidden(&path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let mut body = assemble_directory(&path)?;
            body.insert(
                "_id".to_owned(),
                Value::String(format!("{DESIGN_PREFIX}{name}")),
            );
            let document = DesignDocument::from_json(Value::Object(body))?;
            documents.insert(document.id().to_owned(), document);
        }
        Ok(documents)
    }
}

fn assemble_directory(dir: &Path) -> Result<Map<String, Value>, EngineError> {
    let mut object = Map::new();
    for entry in fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if is_hidden(&path) {
            continue;
        }
        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().into_owned();
            object.insert(name, Value::Object(assemble_directory(&path)?));
            continue;
        }

        let stem = match path.file_stem() {
            Some(stem) => stem.to_string_lossy().into_owned(),
            None => continue,
        };
        let content = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let value = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else {
            Value::String(content)
        };
        object.insert(stem, value);
    }
    Ok(object)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
