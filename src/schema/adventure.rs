use thiserror::Error;

use super::item::{Item, ItemId};
use super::passage::{Passage, PassageId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("passage {0} not found")]
    PassageNotFound(PassageId),
    #[error("item '{0}' not found")]
    ItemNotFound(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub title: String,
}

/// Text shown before passage 1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Introduction {
    pub paragraphs: Vec<String>,
}

/// A complete story document.
///
/// Passages and items keep their authored order; lookups go by id. A
/// document is never edited in place: editors build a new one and run it
/// through the validator before it is played or saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adventure {
    pub metadata: Metadata,
    pub items: Vec<Item>,
    pub introduction: Introduction,
    pub passages: Vec<Passage>,
}

impl Adventure {
    pub fn new(title: &str, introduction: &[&str]) -> Self {
        Self {
            metadata: Metadata {
                title: title.to_string(),
            },
            items: Vec::new(),
            introduction: Introduction {
                paragraphs: introduction.iter().map(|p| p.to_string()).collect(),
            },
            passages: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_passage(mut self, passage: Passage) -> Self {
        self.passages.push(passage);
        self
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// First passage with the given id, if any.
    pub fn passage(&self, id: PassageId) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    /// Like [`Adventure::passage`], for callers that treat a missing
    /// passage as a structural violation.
    pub fn require_passage(&self, id: PassageId) -> Result<&Passage, DocumentError> {
        self.passage(id).ok_or(DocumentError::PassageNotFound(id))
    }

    pub fn require_item(&self, id: &ItemId) -> Result<&Item, DocumentError> {
        self.item(id)
            .ok_or_else(|| DocumentError::ItemNotFound(id.clone()))
    }

    pub fn entry_passage(&self) -> Option<&Passage> {
        self.passage(PassageId::ENTRY)
    }

    pub fn passage_ids(&self) -> impl Iterator<Item = PassageId> + '_ {
        self.passages.iter().map(|p| p.id)
    }

    /// Terminal passages paired with their ending type.
    pub fn endings(&self) -> Vec<(PassageId, Option<&str>)> {
        self.passages
            .iter()
            .filter(|p| p.is_terminal())
            .map(|p| (p.id, p.ending_type.as_deref()))
            .collect()
    }
}
