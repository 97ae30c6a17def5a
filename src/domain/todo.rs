use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Identifier minted from the store's index counter. Its decimal form doubles
/// as the item's hash key and its entry in the key list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(pub u64);

impl ItemId {
    pub fn key(&self) -> String { self.0.to_string() }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidItemId;

impl FromStr for ItemId {
    type Err = InvalidItemId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the canonical decimal form names a stored key: no sign, no
        // leading zeros.
        match s.parse::<u64>() {
            Ok(n) if n > 0 && n.to_string() == s => Ok(Self(n)),
            _ => Err(InvalidItemId),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoItem {
    pub id: ItemId,
    pub title: String,
    pub completed: bool,
    pub url: String,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    /// Missing or `null` means not completed.
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub order: Option<i64>,
}

impl NewItem {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), completed: None, order: None }
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i64>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none() && self.order.is_none()
    }
}
