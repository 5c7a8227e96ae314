//! JSON tree capability set used by every parser in the crate.
//!
//! The resolution engine only talks to [`JsonNode`] and [`JsonBackend`];
//! `serde_json` is the backend that ships with the crate.

use crate::error::JsonError;
use serde_json::Value as JsonValue;
use std::fmt;
use std::path::{Path, PathBuf};

/// Read-only view of one node of a parsed JSON tree.
pub trait JsonNode: fmt::Debug {
    /// Child of an object node by key.
    fn get(&self, key: &str) -> Option<&dyn JsonNode>;
    /// Child of an array node by position.
    fn at(&self, pos: usize) -> Option<&dyn JsonNode>;
    /// Elements of an array node; empty for anything else.
    fn elements(&self) -> Vec<&dyn JsonNode>;
    /// Number of elements (arrays) or members (objects).
    fn size(&self) -> usize;
    fn is_array(&self) -> bool;
    fn is_object(&self) -> bool;
    fn is_null(&self) -> bool;

    fn as_i64(&self) -> Option<i64>;
    fn as_u64(&self) -> Option<u64>;
    fn as_f64(&self) -> Option<f64>;
    fn as_str(&self) -> Option<&str>;
    fn as_bool(&self) -> Option<bool>;

    /// Integer value, truncating floats the way Tiled readers expect.
    fn as_i32(&self) -> Option<i32> {
        self.as_i64()
            .or_else(|| self.as_f64().map(|f| f as i64))
            .and_then(|v| i32::try_from(v).ok())
    }

    fn as_u32(&self) -> Option<u32> {
        self.as_u64()
            .or_else(|| self.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok())
    }

    fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|f| f as f32)
    }

    /// Elements of the array stored under `key`.
    fn array(&self, key: &str) -> Vec<&dyn JsonNode> {
        self.get(key).map(|n| n.elements()).unwrap_or_default()
    }

    /// 1 when `key` exists, 0 otherwise.
    fn count(&self, key: &str) -> usize {
        usize::from(self.get(key).is_some())
    }

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn field_i32(&self, key: &str) -> Option<i32> {
        self.get(key)?.as_i32()
    }
    fn field_u32(&self, key: &str) -> Option<u32> {
        self.get(key)?.as_u32()
    }
    fn field_i64(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }
    fn field_f32(&self, key: &str) -> Option<f32> {
        self.get(key)?.as_f32()
    }
    fn field_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }
    fn field_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }
    fn field_string(&self, key: &str) -> Option<String> {
        self.field_str(key).map(str::to_owned)
    }
}

impl JsonNode for JsonValue {
    fn get(&self, key: &str) -> Option<&dyn JsonNode> {
        self.as_object()?.get(key).map(|v| v as &dyn JsonNode)
    }

    fn at(&self, pos: usize) -> Option<&dyn JsonNode> {
        self.as_array()?.get(pos).map(|v| v as &dyn JsonNode)
    }

    fn elements(&self) -> Vec<&dyn JsonNode> {
        match self {
            JsonValue::Array(items) => items.iter().map(|v| v as &dyn JsonNode).collect(),
            _ => Vec::new(),
        }
    }

    fn size(&self) -> usize {
        match self {
            JsonValue::Array(items) => items.len(),
            JsonValue::Object(members) => members.len(),
            _ => 0,
        }
    }

    fn is_array(&self) -> bool {
        JsonValue::is_array(self)
    }
    fn is_object(&self) -> bool {
        JsonValue::is_object(self)
    }
    fn is_null(&self) -> bool {
        JsonValue::is_null(self)
    }
    fn as_i64(&self) -> Option<i64> {
        JsonValue::as_i64(self)
    }
    fn as_u64(&self) -> Option<u64> {
        JsonValue::as_u64(self)
    }
    fn as_f64(&self) -> Option<f64> {
        JsonValue::as_f64(self)
    }
    fn as_str(&self) -> Option<&str> {
        JsonValue::as_str(self)
    }
    fn as_bool(&self) -> Option<bool> {
        JsonValue::as_bool(self)
    }
}

/// A parsed file: root node plus the directory relative paths resolve against.
#[derive(Debug)]
pub struct JsonDocument {
    root: Box<dyn JsonNode>,
    directory: PathBuf,
}

impl JsonDocument {
    pub fn new(root: Box<dyn JsonNode>, directory: impl Into<PathBuf>) -> Self {
        JsonDocument {
            root,
            directory: directory.into(),
        }
    }

    pub fn root(&self) -> &dyn JsonNode {
        self.root.as_ref()
    }

    /// Directory of the file this document was read from; empty for buffers.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
    }
}

/// Produces [`JsonDocument`]s from files or byte buffers.
pub trait JsonBackend {
    fn parse_buffer(&self, data: &[u8]) -> Result<JsonDocument, JsonError>;

    /// Reads and parses `path`; the document's directory is the file's parent.
    fn parse_file(&self, path: &Path) -> Result<JsonDocument, JsonError> {
        let bytes = std::fs::read(path).map_err(|source| JsonError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = self.parse_buffer(&bytes).map_err(|err| match err {
            JsonError::Syntax { message, .. } => JsonError::Syntax {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        doc.set_directory(
            path.parent()
                .map(|d| d.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("./")),
        );
        Ok(doc)
    }
}

/// [`JsonBackend`] built on `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonBackend;

impl JsonBackend for SerdeJsonBackend {
    fn parse_buffer(&self, data: &[u8]) -> Result<JsonDocument, JsonError> {
        let value: JsonValue = serde_json::from_slice(data).map_err(|e| JsonError::Syntax {
            path: None,
            message: e.to_string(),
        })?;
        Ok(JsonDocument::new(Box::new(value), PathBuf::new()))
    }
}
