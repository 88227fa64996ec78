//! Typed view of the checklist document
//!
//! The store and the service treat the document as opaque JSON. The shape
//! described here (an object of category id -> list of items) is only a
//! convention between the editor and the widget. This module reads it the
//! way the widget does: leniently, with absent categories as empty lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One checklist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Item {
    /// Read an item the way the widget renders it: `completed` by JS
    /// truthiness, numeric text as its decimal form, any other text as empty,
    /// and `url` only when it is a non-empty string.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = match fields.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let url = match fields.get("url") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        };

        Self {
            text,
            completed: fields.get("completed").is_some_and(is_truthy),
            url,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A displayed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// Key in the document
    pub id: &'static str,
    /// Header label
    pub name: &'static str,
}

/// Columns shown by the widget, in display order
pub const DEFAULT_CATEGORIES: [Category; 5] = [
    Category { id: "priority", name: "PRIORITY" },
    Category { id: "work", name: "WORK" },
    Category { id: "personal", name: "PERSONAL" },
    Category { id: "reading", name: "READING" },
    Category { id: "other", name: "OTHER" },
];

/// Document shape violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("document is not a JSON object")]
    NotAnObject,

    #[error("category {0:?} is not an array")]
    NotAnArray(String),

    #[error("item {index} in {category:?} is invalid: {reason}")]
    InvalidItem {
        category: String,
        index: usize,
        reason: String,
    },
}

/// Parsed checklist
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    categories: BTreeMap<String, Vec<Item>>,
}

impl Checklist {
    /// Parse document bytes.
    ///
    /// Never fails: unparseable input yields an empty checklist, and
    /// non-array categories and non-object items are skipped. Object items
    /// are always kept, see [`Item::from_fields`].
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(e) => {
                tracing::debug!("Unparseable document, treating as empty: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let categories = map
            .into_iter()
            .filter_map(|(id, entries)| match entries {
                Value::Array(entries) => {
                    let items = entries
                        .into_iter()
                        .filter_map(|entry| match entry {
                            Value::Object(fields) => Some(Item::from_fields(&fields)),
                            _ => None,
                        })
                        .collect();
                    Some((id, items))
                }
                _ => None,
            })
            .collect();

        Self { categories }
    }

    /// Items in a category; absent categories are empty
    pub fn items(&self, id: &str) -> &[Item] {
        self.categories.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(active, total)` item counts for a category
    pub fn counts(&self, id: &str) -> (usize, usize) {
        let items = self.items(id);
        let active = items.iter().filter(|item| !item.completed).count();
        (active, items.len())
    }

    /// Category ids present in the document, sorted
    pub fn category_ids(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }
}

/// Strictly check that `value` follows the object-of-item-arrays convention
pub fn validate_shape(value: &Value) -> Result<(), ShapeError> {
    let map = value.as_object().ok_or(ShapeError::NotAnObject)?;

    for (category, entries) in map {
        let entries = entries
            .as_array()
            .ok_or_else(|| ShapeError::NotAnArray(category.clone()))?;

        for (index, entry) in entries.iter().enumerate() {
            Item::deserialize(entry).map_err(|e| ShapeError::InvalidItem {
                category: category.clone(),
                index,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}
