//! WASM bindings for adventure-engine: powers the in-browser reader.
//!
//! The host page owns storage: it reads `progress()` after each call and
//! hands it back through `resume()` on the next visit.

use wasm_bindgen::prelude::*;

use adventure_engine::core::format::{self, Format};
use adventure_engine::core::interpreter::{Action, Interpreter, PlayState, Snapshot};
use adventure_engine::core::progress::Progress;
use adventure_engine::core::session::choice_label;
use adventure_engine::core::validator::{validate, Violation};
use adventure_engine::export;
use adventure_engine::schema::adventure::Adventure;

// ---------------------------------------------------------------------------
// Embedded demo adventure: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const LIGHTHOUSE: &str = include_str!("../../adventures/lighthouse.ron");
}

#[wasm_bindgen(start)]
pub fn init() {
    tracing_wasm::set_as_global_default();
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct ValidationResult<'a> {
    playable: bool,
    errors: Vec<&'a Violation>,
    warnings: Vec<&'a Violation>,
}

#[derive(serde::Serialize)]
struct View {
    state: &'static str,
    passage_id: Option<u32>,
    paragraphs: Vec<String>,
    choices: Vec<String>,
    ending_type: Option<String>,
    inventory: Vec<String>,
    inventory_summary: String,
}

fn parse_format(s: &str) -> Result<Format, JsError> {
    match s.to_lowercase().as_str() {
        "ron" | "" => Ok(Format::Ron),
        "json" => Ok(Format::Json),
        other => Err(JsError::new(&format!("Unknown format: {other}"))),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// AdventurePlayer: the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct AdventurePlayer {
    adventure: Adventure,
    adventure_id: String,
    snapshot: Snapshot,
    debug_mode: bool,
}

#[wasm_bindgen]
impl AdventurePlayer {
    /// Parse and validate an adventure. Fails with a readable message on
    /// malformed input or when validation reports errors.
    #[wasm_bindgen(constructor)]
    pub fn new(adventure_id: &str, text: &str, format_name: &str) -> Result<AdventurePlayer, JsError> {
        let adventure = format::parse_as(text, parse_format(format_name)?)
            .map_err(|e| JsError::new(&format!("Import failed: {e}")))?;

        let report = validate(&adventure);
        if !report.is_playable() {
            return Err(JsError::new(&format!("Adventure is not playable:\n{report}")));
        }

        Ok(AdventurePlayer {
            adventure,
            adventure_id: adventure_id.to_string(),
            snapshot: Snapshot::default(),
            debug_mode: false,
        })
    }

    /// The bundled demo adventure.
    pub fn demo() -> Result<AdventurePlayer, JsError> {
        AdventurePlayer::new("lighthouse", data::LIGHTHOUSE, "ron")
    }

    /// Validate a document without playing it. Returns JSON
    /// `{ playable, errors, warnings }`.
    pub fn validate(text: &str, format_name: &str) -> Result<String, JsError> {
        let adventure = format::parse_as(text, parse_format(format_name)?)
            .map_err(|e| JsError::new(&format!("Import failed: {e}")))?;
        let report = validate(&adventure);
        to_json(&ValidationResult {
            playable: report.is_playable(),
            errors: report.errors().collect(),
            warnings: report.warnings().collect(),
        })
    }

    pub fn title(&self) -> String {
        self.adventure.title().to_string()
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    pub fn start(&mut self) -> Result<String, JsError> {
        self.perform(Action::Start)
    }

    pub fn choose(&mut self, index: usize) -> Result<String, JsError> {
        self.perform(Action::Choose(index))
    }

    pub fn restart(&mut self) -> Result<String, JsError> {
        self.perform(Action::Restart)
    }

    /// JSON description of what the reader currently sees.
    pub fn view(&self) -> Result<String, JsError> {
        let interp = Interpreter::new(&self.adventure);
        let passage = interp.current_passage(&self.snapshot);

        let (state, ending_type) = match &self.snapshot.state {
            PlayState::Introduction => ("introduction", None),
            PlayState::InPassage(_) => ("passage", None),
            PlayState::Ended { ending_type, .. } => ("ended", Some(ending_type.clone())),
        };
        let paragraphs = match passage {
            Some(p) => p.paragraphs.clone(),
            None => self.adventure.introduction.paragraphs.clone(),
        };
        let choices = match (&self.snapshot.state, passage) {
            (PlayState::InPassage(_), Some(p)) => p
                .choices
                .iter()
                .map(|c| choice_label(c, self.debug_mode))
                .collect(),
            _ => Vec::new(),
        };

        to_json(&View {
            state,
            passage_id: self.snapshot.state.passage_id().map(|id| id.0),
            paragraphs,
            choices,
            ending_type,
            inventory: self
                .snapshot
                .inventory
                .item_names(&self.adventure)
                .into_iter()
                .map(String::from)
                .collect(),
            inventory_summary: self.snapshot.inventory.summary(&self.adventure),
        })
    }

    /// JSON progress record for the host to store, or `null` before start.
    pub fn progress(&self) -> Result<String, JsError> {
        let progress = self.snapshot.state.passage_id().map(|current_passage| Progress {
            adventure_id: self.adventure_id.clone(),
            current_passage,
            inventory: self.snapshot.inventory.clone(),
        });
        to_json(&progress)
    }

    /// Restore a record produced by `progress()`. Stale records are
    /// rejected and leave the player untouched.
    pub fn resume(&mut self, progress_json: &str) -> Result<String, JsError> {
        let progress: Progress = serde_json::from_str(progress_json)
            .map_err(|e| JsError::new(&format!("Invalid progress JSON: {e}")))?;
        self.snapshot = Snapshot::resume(&self.adventure, &progress)
            .map_err(|e| JsError::new(&format!("Cannot resume: {e}")))?;
        self.view()
    }

    /// JSON `{ filename, mime_type, contents }` for a download.
    pub fn export(&self, format_name: &str) -> Result<String, JsError> {
        let file = export::export(&self.adventure, parse_format(format_name)?)
            .map_err(|e| JsError::new(&format!("Export failed: {e}")))?;
        to_json(&file)
    }
}

// Private helpers
impl AdventurePlayer {
    fn perform(&mut self, action: Action) -> Result<String, JsError> {
        self.snapshot = Interpreter::new(&self.adventure)
            .apply(&self.snapshot, action)
            .map_err(|e| JsError::new(&format!("{e}")))?;
        self.view()
    }
}
