//! Conversation items and their serialized JSON form.
//!
//! Both backends store items as UTF-8 JSON: the list-store keeps one encoded
//! document per list element, the document-store keeps the whole sequence as
//! a single JSON array string. This module is the only place that encoding
//! lives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Item codec failure.
///
/// `NotSerializable` surfaces before any backend I/O is attempted, so a bad
/// item in a batch never partially writes. `Corrupt` means data already in
/// the store could not be decoded back into items.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The value has no JSON representation (e.g. a map with non-string keys).
    #[error("item is not JSON-serializable: {0}")]
    NotSerializable(#[source] serde_json::Error),
    /// Stored conversation data failed to parse.
    #[error("stored conversation data is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

/// One opaque conversation record.
///
/// Typically a chat turn with `role` and `content` fields, but any JSON-shaped
/// structure the caller supplies (tool calls, structured content blocks)
/// passes through untouched. The crate never inspects fields; items are
/// serialized whole on write and deserialized whole on read. Position in the
/// stored sequence is the only ordering — items carry no sequence numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionItem(Value);

impl SessionItem {
    /// Convert any serializable value into an item.
    pub fn new<T: Serialize>(value: T) -> Result<Self, ItemError> {
        serde_json::to_value(value)
            .map(Self)
            .map_err(ItemError::NotSerializable)
    }

    /// Build the common chat-turn shape: `{"role": ..., "content": ...}`.
    pub fn message(role: &str, content: &str) -> Self {
        Self(serde_json::json!({ "role": role, "content": content }))
    }

    /// Borrow the underlying JSON value.
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serialize this item to its stored form (one list-store element).
    pub fn to_json(&self) -> Result<String, ItemError> {
        serde_json::to_string(&self.0).map_err(ItemError::NotSerializable)
    }

    /// Decode one stored element back into an item.
    pub fn from_json(data: &str) -> Result<Self, ItemError> {
        serde_json::from_str::<Value>(data)
            .map(Self)
            .map_err(ItemError::Corrupt)
    }
}

impl From<Value> for SessionItem {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Serialize a full item sequence to one JSON array string (the
/// document-store `conversation_data` attribute).
pub fn encode_items(items: &[SessionItem]) -> Result<String, ItemError> {
    serde_json::to_string(items).map_err(ItemError::NotSerializable)
}

/// Decode a stored JSON array string back into an item sequence.
pub fn decode_items(data: &str) -> Result<Vec<SessionItem>, ItemError> {
    serde_json::from_str(data).map_err(ItemError::Corrupt)
}
