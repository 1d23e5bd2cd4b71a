use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for item IDs. Unique within one adventure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Something the reader can carry. Items are declared once per adventure
/// and referenced by id from passage effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.into(),
        }
    }
}

/// An inventory mutation applied when a passage is entered.
///
/// Effects run in list order. Adding an item already held, or removing one
/// that is not held, changes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    AddItem { item: ItemId },
    RemoveItem { item: ItemId },
}

impl Effect {
    pub fn add(item: impl Into<String>) -> Self {
        Self::AddItem {
            item: ItemId::new(item),
        }
    }

    pub fn remove(item: impl Into<String>) -> Self {
        Self::RemoveItem {
            item: ItemId::new(item),
        }
    }

    /// The item this effect touches.
    pub fn item(&self) -> &ItemId {
        match self {
            Self::AddItem { item } | Self::RemoveItem { item } => item,
        }
    }

    /// The `type` tag used in the persisted form: "addItem" or "removeItem".
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "addItem",
            Self::RemoveItem { .. } => "removeItem",
        }
    }
}
