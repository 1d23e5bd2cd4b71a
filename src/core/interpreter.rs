/// Runtime interpreter: walks an adventure passage by passage.
///
/// The interpreter is pure: every transition takes a [`Snapshot`] and an
/// [`Action`] and returns the next snapshot. Persistence is layered on top
/// by [`crate::core::session::PlaySession`].

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::progress::Progress;
use crate::schema::adventure::{Adventure, DocumentError};
use crate::schema::item::{Effect, ItemId};
use crate::schema::passage::{Passage, PassageId};

/// Shown by presentation layers when the reader carries nothing.
pub const EMPTY_INVENTORY_LABEL: &str = "No items yet";

/// A transition the caller asked for that the current state does not allow.
/// A validated adventure driven by the choices it offers never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTransition {
    #[error("play has already started")]
    AlreadyStarted,
    #[error("play has not started yet")]
    NotStarted,
    #[error("passage {0} is an ending and offers no choices")]
    AtEnding(PassageId),
    #[error("choice {index} is out of range for passage {passage} ({available} choices)")]
    ChoiceOutOfRange {
        passage: PassageId,
        index: usize,
        available: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpreterError {
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransition),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

/// Where the reader is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayState {
    /// Reading the introduction; no passage entered yet.
    Introduction,
    InPassage(PassageId),
    Ended {
        passage: PassageId,
        ending_type: String,
    },
}

impl PlayState {
    /// The passage on screen, if play has started.
    pub fn passage_id(&self) -> Option<PassageId> {
        match self {
            Self::Introduction => None,
            Self::InPassage(id) => Some(*id),
            Self::Ended { passage, .. } => Some(*passage),
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}

/// The set of items the reader carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: FxHashSet<ItemId>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter()
    }

    /// Apply one effect. Adding a held item or removing a missing one is a
    /// no-op.
    pub fn apply(&mut self, effect: &Effect) {
        match effect {
            Effect::AddItem { item } => {
                self.items.insert(item.clone());
            }
            Effect::RemoveItem { item } => {
                self.items.remove(item);
            }
        }
    }

    pub fn apply_all(&mut self, effects: &[Effect]) {
        for effect in effects {
            self.apply(effect);
        }
    }

    /// Item ids in a stable order, for persistence and comparison.
    pub fn sorted_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.items.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Display names of held items, in the adventure's declaration order.
    /// Ids the adventure does not declare are listed last under their id.
    pub fn item_names<'a>(&'a self, adventure: &'a Adventure) -> Vec<&'a str> {
        let mut names: Vec<&str> = adventure
            .items
            .iter()
            .filter(|item| self.items.contains(&item.id))
            .map(|item| item.name.as_str())
            .collect();

        let mut unknown: Vec<&str> = self
            .items
            .iter()
            .filter(|id| adventure.item(id).is_none())
            .map(|id| id.as_str())
            .collect();
        unknown.sort_unstable();
        names.extend(unknown);
        names
    }

    /// One-line description: comma-separated names, or
    /// [`EMPTY_INVENTORY_LABEL`] when empty.
    pub fn summary(&self, adventure: &Adventure) -> String {
        if self.is_empty() {
            EMPTY_INVENTORY_LABEL.to_string()
        } else {
            self.item_names(adventure).join(", ")
        }
    }
}

impl FromIterator<ItemId> for Inventory {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Interpreter state: position plus inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state: PlayState,
    pub inventory: Inventory,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            state: PlayState::Introduction,
            inventory: Inventory::new(),
        }
    }
}

impl Snapshot {
    /// Rebuild a snapshot from persisted progress. Fails when the saved
    /// passage no longer exists in the adventure.
    pub fn resume(adventure: &Adventure, progress: &Progress) -> Result<Snapshot, DocumentError> {
        let passage = adventure.require_passage(progress.current_passage)?;
        Ok(Snapshot {
            state: state_for(passage),
            inventory: progress.inventory.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Choose(usize),
    Restart,
}

fn state_for(passage: &Passage) -> PlayState {
    match (passage.is_terminal(), &passage.ending_type) {
        (true, Some(ending_type)) => PlayState::Ended {
            passage: passage.id,
            ending_type: ending_type.clone(),
        },
        // An ending without a type never passes validation; keep the reader
        // on the passage rather than inventing a label.
        _ => PlayState::InPassage(passage.id),
    }
}

/// Computes transitions over one adventure.
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'a> {
    adventure: &'a Adventure,
}

impl<'a> Interpreter<'a> {
    pub fn new(adventure: &'a Adventure) -> Self {
        Self { adventure }
    }

    pub fn adventure(&self) -> &'a Adventure {
        self.adventure
    }

    pub fn apply(&self, snapshot: &Snapshot, action: Action) -> Result<Snapshot, InterpreterError> {
        match action {
            Action::Start => self.start(snapshot),
            Action::Choose(index) => self.choose(snapshot, index),
            Action::Restart => self.restart(),
        }
    }

    /// `Introduction -> InPassage(1)`. The inventory is carried over.
    pub fn start(&self, snapshot: &Snapshot) -> Result<Snapshot, InterpreterError> {
        if snapshot.state != PlayState::Introduction {
            return Err(InvalidTransition::AlreadyStarted.into());
        }
        let entry = self.adventure.require_passage(PassageId::ENTRY)?;
        tracing::debug!(passage = %entry.id, "start");
        Ok(Snapshot {
            state: state_for(entry),
            inventory: snapshot.inventory.clone(),
        })
    }

    /// Follow choice `index` of the current passage and apply the target
    /// passage's effects in order.
    pub fn choose(&self, snapshot: &Snapshot, index: usize) -> Result<Snapshot, InterpreterError> {
        let current = match &snapshot.state {
            PlayState::Introduction => return Err(InvalidTransition::NotStarted.into()),
            PlayState::Ended { passage, .. } => {
                return Err(InvalidTransition::AtEnding(*passage).into())
            }
            PlayState::InPassage(id) => self.adventure.require_passage(*id)?,
        };

        if current.is_terminal() {
            return Err(InvalidTransition::AtEnding(current.id).into());
        }
        let choice = current
            .choice(index)
            .ok_or(InvalidTransition::ChoiceOutOfRange {
                passage: current.id,
                index,
                available: current.choices.len(),
            })?;
        let target = self.adventure.require_passage(choice.goto)?;

        let mut inventory = snapshot.inventory.clone();
        inventory.apply_all(&target.effects);

        let state = state_for(target);
        tracing::debug!(from = %current.id, to = %target.id, ended = state.is_ended(), "choose");
        Ok(Snapshot { state, inventory })
    }

    /// Back to passage 1 with an empty inventory, from any state.
    pub fn restart(&self) -> Result<Snapshot, InterpreterError> {
        let entry = self.adventure.require_passage(PassageId::ENTRY)?;
        tracing::debug!("restart");
        Ok(Snapshot {
            state: state_for(entry),
            inventory: Inventory::new(),
        })
    }

    /// The passage on screen, if play has started.
    pub fn current_passage(&self, snapshot: &Snapshot) -> Option<&'a Passage> {
        snapshot
            .state
            .passage_id()
            .and_then(|id| self.adventure.passage(id))
    }
}
