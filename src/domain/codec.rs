//! Conversions between a to-do item, its JSON wire form and the flat string
//! hash it is stored as.

use std::collections::HashMap;

use thiserror::Error;

use super::todo::{ItemId, ItemPatch, NewItem, ToDoItem};

pub const TITLE: &str = "title";
pub const COMPLETED: &str = "completed";
pub const URL: &str = "url";
pub const ORDER: &str = "order";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed item body: {0}")]
    Malformed(String),
    #[error("stored item {id} has no `{field}` field")]
    MissingField { id: ItemId, field: &'static str },
    #[error("stored item {id} has an invalid `{field}` value: {value:?}")]
    InvalidField { id: ItemId, field: &'static str, value: String },
}

pub fn encode(item: &ToDoItem) -> serde_json::Value {
    serde_json::json!({ "title": item.title, "completed": item.completed, "url": item.url, "order": item.order })
}

pub fn encode_all(items: &[ToDoItem]) -> serde_json::Value {
    serde_json::Value::Array(items.iter().map(encode).collect())
}

pub fn decode(body: &[u8]) -> Result<NewItem, CodecError> {
    serde_json::from_slice(body).map_err(|e| CodecError::Malformed(e.to_string()))
}

pub fn decode_patch(body: &[u8]) -> Result<ItemPatch, CodecError> {
    serde_json::from_slice(body).map_err(|e| CodecError::Malformed(e.to_string()))
}

pub fn to_hash_fields(item: &ToDoItem) -> Vec<(String, String)> {
    let mut fields = vec![
        (TITLE.to_string(), item.title.clone()),
        (COMPLETED.to_string(), item.completed.to_string()),
        (URL.to_string(), item.url.clone()),
    ];
    if let Some(order) = item.order {
        fields.push((ORDER.to_string(), order.to_string()));
    }
    fields
}

pub fn patch_hash_fields(patch: &ItemPatch) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    if let Some(title) = &patch.title { fields.push((TITLE.to_string(), title.clone())); }
    if let Some(completed) = patch.completed { fields.push((COMPLETED.to_string(), completed.to_string())); }
    if let Some(order) = patch.order { fields.push((ORDER.to_string(), order.to_string())); }
    fields
}

/// Rebuilds a typed item from the strings the store hands back.
pub fn from_hash(id: ItemId, mut fields: HashMap<String, String>) -> Result<ToDoItem, CodecError> {
    let title = fields.remove(TITLE).ok_or(CodecError::MissingField { id, field: TITLE })?;
    let completed = match fields.remove(COMPLETED) {
        None => false,
        Some(v) => v.parse::<bool>().map_err(|_| CodecError::InvalidField { id, field: COMPLETED, value: v })?,
    };
    let order = match fields.remove(ORDER) {
        None => None,
        Some(v) if v.is_empty() => None,
        Some(v) => Some(v.parse::<i64>().map_err(|_| CodecError::InvalidField { id, field: ORDER, value: v })?),
    };
    let url = fields.remove(URL).unwrap_or_default();
    Ok(ToDoItem { id, title, completed, url, order })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> ToDoItem {
        ToDoItem { id: ItemId(7), title: "Buy milk".into(), completed: false, url: "http://localhost/todo/7".into(), order: None }
    }

    #[test]
    fn encode_writes_null_order() {
        let body = encode(&item());
        assert_eq!(body, json!({ "title": "Buy milk", "completed": false, "url": "http://localhost/todo/7", "order": null }));
    }

    #[test]
    fn decode_requires_string_title() {
        assert!(matches!(decode(br#"{"completed":true}"#), Err(CodecError::Malformed(_))));
        assert!(matches!(decode(br#"{"title":5}"#), Err(CodecError::Malformed(_))));
        assert!(matches!(decode(b"[1,2]"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode(b"not json"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn decode_defaults_completed_and_ignores_url() {
        let parsed = decode(br#"{"title":"X","url":"http://elsewhere/1"}"#).unwrap();
        assert_eq!(parsed, NewItem::titled("X"));
        let parsed = decode(br#"{"title":"X","completed":true,"order":3}"#).unwrap();
        assert_eq!(parsed.completed, Some(true));
        assert_eq!(parsed.order, Some(3));
    }

    #[test]
    fn decode_treats_null_completed_as_absent() {
        let parsed = decode(br#"{"title":"X","completed":null,"order":null}"#).unwrap();
        assert_eq!(parsed, NewItem::titled("X"));
        assert!(matches!(decode(br#"{"title":"X","completed":"no"}"#), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn patch_only_renders_present_fields() {
        let patch = decode_patch(br#"{"completed":true}"#).unwrap();
        assert_eq!(patch_hash_fields(&patch), vec![(COMPLETED.to_string(), "true".to_string())]);
        assert!(decode_patch(b"{}").unwrap().is_empty());
        assert!(matches!(decode_patch(br#"{"order":"first"}"#), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn hash_fields_round_back_to_typed_values() {
        let mut original = item();
        original.order = Some(-2);
        let fields: HashMap<_, _> = to_hash_fields(&original).into_iter().collect();
        assert_eq!(fields.get(COMPLETED).map(String::as_str), Some("false"));
        assert_eq!(fields.get(ORDER).map(String::as_str), Some("-2"));
        assert_eq!(from_hash(ItemId(7), fields).unwrap(), original);
    }

    #[test]
    fn corrupt_hash_is_reported() {
        let fields: HashMap<_, _> = [(COMPLETED.to_string(), "true".to_string())].into_iter().collect();
        assert_eq!(from_hash(ItemId(1), fields), Err(CodecError::MissingField { id: ItemId(1), field: TITLE }));

        let fields: HashMap<_, _> = [(TITLE.to_string(), "t".to_string()), (COMPLETED.to_string(), "yes".to_string())].into_iter().collect();
        assert!(matches!(from_hash(ItemId(1), fields), Err(CodecError::InvalidField { field: COMPLETED, .. })));
    }
}
