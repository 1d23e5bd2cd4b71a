use serde::{Deserialize, Serialize};
use std::fmt;

use super::item::Effect;

/// Newtype wrapper for passage IDs. Valid ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageId(pub u32);

impl PassageId {
    /// The passage the reader lands on after the introduction.
    pub const ENTRY: PassageId = PassageId(1);
}

impl fmt::Display for PassageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labelled edge from one passage to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub text: String,
    pub goto: PassageId,
}

impl Choice {
    pub fn new(text: impl Into<String>, goto: u32) -> Self {
        Self {
            text: text.into(),
            goto: PassageId(goto),
        }
    }
}

/// One screen of narrative: paragraphs, the choices leading out of it and
/// the effects applied on arrival.
///
/// A passage without choices is an ending and names its `ending_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub id: PassageId,
    pub paragraphs: Vec<String>,
    pub choices: Vec<Choice>,
    pub effects: Vec<Effect>,
    pub notes: Option<String>,
    pub ending_type: Option<String>,
}

impl Passage {
    /// A passage with paragraphs and nothing else. Chain the `with_*`
    /// helpers to add choices, effects or an ending.
    pub fn new(id: u32, paragraphs: &[&str]) -> Self {
        Self {
            id: PassageId(id),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
            choices: Vec::new(),
            effects: Vec::new(),
            notes: None,
            ending_type: None,
        }
    }

    pub fn with_choice(mut self, text: &str, goto: u32) -> Self {
        self.choices.push(Choice::new(text, goto));
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_ending(mut self, ending_type: &str) -> Self {
        self.ending_type = Some(ending_type.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    /// A passage is terminal iff it offers no choices.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }

    /// Paragraphs joined into one block, separated by blank lines.
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_iff_no_choices() {
        let ending = Passage::new(2, &["The end."]).with_ending("victory");
        assert!(ending.is_terminal());

        let fork = Passage::new(1, &["A fork."]).with_choice("Left", 2);
        assert!(!fork.is_terminal());
    }

    #[test]
    fn choice_lookup() {
        let p = Passage::new(1, &["Hall."])
            .with_choice("North", 2)
            .with_choice("South", 3);
        assert_eq!(p.choice(1).map(|c| c.goto), Some(PassageId(3)));
        assert!(p.choice(2).is_none());
    }

    #[test]
    fn text_joins_paragraphs() {
        let p = Passage::new(1, &["One.", "Two."]);
        assert_eq!(p.text(), "One.\n\nTwo.");
    }
}
