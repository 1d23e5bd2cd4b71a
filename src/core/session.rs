/// Play session: the interpreter wired to a progress store.
///
/// A session validates the adventure once, hydrates from the store once,
/// and persists the new position after every transition. Store failures
/// never interrupt play: they are logged, kept in [`PlaySession::warnings`],
/// and the in-memory snapshot stays authoritative.

use thiserror::Error;

use crate::core::interpreter::{Action, Interpreter, InterpreterError, PlayState, Snapshot};
use crate::core::progress::ProgressStore;
use crate::core::validator::{validate, ValidationReport};
use crate::schema::adventure::Adventure;
use crate::schema::passage::{Choice, Passage};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("adventure failed validation:\n{0}")]
    Invalid(ValidationReport),
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),
}

/// Session options. Built via `SessionConfig::builder()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Append each choice's target passage id to its label.
    pub debug_mode: bool,
    /// Persist after every transition.
    pub autosave: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            autosave: true,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder {
            config: SessionConfig::default(),
        }
    }
}

pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn debug_mode(mut self, enabled: bool) -> Self {
        self.config.debug_mode = enabled;
        self
    }

    pub fn autosave(mut self, enabled: bool) -> Self {
        self.config.autosave = enabled;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Label for a choice, with the target id appended in debug mode.
pub fn choice_label(choice: &Choice, debug_mode: bool) -> String {
    if debug_mode {
        format!("{} [-> {}]", choice.text, choice.goto)
    } else {
        choice.text.clone()
    }
}

pub struct PlaySession<'a, S: ProgressStore> {
    adventure: &'a Adventure,
    adventure_id: String,
    store: S,
    config: SessionConfig,
    snapshot: Snapshot,
    warnings: Vec<String>,
}

impl<'a, S: ProgressStore> PlaySession<'a, S> {
    /// Validate `adventure` and resume from the store if it holds progress
    /// for `adventure_id`. Unusable saved progress is discarded with a
    /// warning and play begins at the introduction.
    pub fn open(
        adventure: &'a Adventure,
        adventure_id: impl Into<String>,
        store: S,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let report = validate(adventure);
        if !report.is_playable() {
            return Err(SessionError::Invalid(report));
        }

        let mut session = PlaySession {
            adventure,
            adventure_id: adventure_id.into(),
            store,
            config,
            snapshot: Snapshot::default(),
            warnings: Vec::new(),
        };
        session.hydrate();
        tracing::info!(
            adventure = %session.adventure_id,
            state = ?session.snapshot.state,
            "opened play session"
        );
        Ok(session)
    }

    fn hydrate(&mut self) {
        match self.store.load(&self.adventure_id) {
            Ok(Some(progress)) => match Snapshot::resume(self.adventure, &progress) {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(e) => self.warn(format!("discarding saved progress: {}", e)),
            },
            Ok(None) => {}
            Err(e) => self.warn(format!("could not load saved progress: {}", e)),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(adventure = %self.adventure_id, "{}", message);
        self.warnings.push(message);
    }

    pub fn adventure(&self) -> &'a Adventure {
        self.adventure
    }

    pub fn adventure_id(&self) -> &str {
        &self.adventure_id
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.config.debug_mode = enabled;
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &PlayState {
        &self.snapshot.state
    }

    pub fn current_passage(&self) -> Option<&'a Passage> {
        Interpreter::new(self.adventure).current_passage(&self.snapshot)
    }

    /// Labels for the choices currently on offer.
    pub fn choice_labels(&self) -> Vec<String> {
        match (&self.snapshot.state, self.current_passage()) {
            (PlayState::InPassage(_), Some(passage)) => passage
                .choices
                .iter()
                .map(|c| choice_label(c, self.config.debug_mode))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn inventory_summary(&self) -> String {
        self.snapshot.inventory.summary(self.adventure)
    }

    /// Persistence problems seen so far, oldest first.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn start(&mut self) -> Result<&Snapshot, SessionError> {
        self.perform(Action::Start)
    }

    pub fn choose(&mut self, index: usize) -> Result<&Snapshot, SessionError> {
        self.perform(Action::Choose(index))
    }

    /// Drop saved progress and begin again at passage 1 with nothing in
    /// hand.
    pub fn restart(&mut self) -> Result<&Snapshot, SessionError> {
        if self.config.autosave {
            if let Err(e) = self.store.clear(&self.adventure_id) {
                self.warn(format!("could not clear saved progress: {}", e));
            }
        }
        tracing::info!(adventure = %self.adventure_id, "restart");
        self.perform(Action::Restart)
    }

    pub fn perform(&mut self, action: Action) -> Result<&Snapshot, SessionError> {
        let next = Interpreter::new(self.adventure).apply(&self.snapshot, action)?;
        self.snapshot = next;
        self.persist();
        Ok(&self.snapshot)
    }

    fn persist(&mut self) {
        if !self.config.autosave {
            return;
        }
        let Some(passage) = self.snapshot.state.passage_id() else {
            return;
        };
        if let Err(e) = self
            .store
            .save(&self.adventure_id, passage, &self.snapshot.inventory)
        {
            self.warn(format!("could not save progress: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interpreter::{Inventory, EMPTY_INVENTORY_LABEL};
    use crate::core::progress::{MemoryProgressStore, PersistenceFailure, Progress};
    use crate::schema::item::{Effect, Item, ItemId};
    use crate::schema::passage::PassageId;

    fn adventure() -> Adventure {
        Adventure::new("Bridge", &["A rope bridge sways."])
            .with_item(Item::new("rope", "Coil of rope"))
            .with_passage(
                Passage::new(1, &["The gorge."])
                    .with_choice("Cross", 2)
                    .with_choice("Climb down", 3),
            )
            .with_passage(
                Passage::new(2, &["Halfway across."])
                    .with_effect(Effect::add("rope"))
                    .with_choice("Keep going", 3),
            )
            .with_passage(Passage::new(3, &["The far side."]).with_ending("victory"))
    }

    struct BrokenStore;

    impl ProgressStore for BrokenStore {
        fn load(&self, _: &str) -> Result<Option<Progress>, PersistenceFailure> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into())
        }

        fn save(&mut self, _: &str, _: PassageId, _: &Inventory) -> Result<(), PersistenceFailure> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into())
        }

        fn clear(&mut self, _: &str) -> Result<(), PersistenceFailure> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into())
        }
    }

    #[test]
    fn persists_after_each_transition() {
        let adv = adventure();
        let mut session =
            PlaySession::open(&adv, "bridge", MemoryProgressStore::new(), SessionConfig::default())
                .unwrap();
        assert_eq!(session.state(), &PlayState::Introduction);
        assert!(session.store().load("bridge").unwrap().is_none());

        session.start().unwrap();
        let saved = session.store().load("bridge").unwrap().unwrap();
        assert_eq!(saved.current_passage, PassageId(1));

        session.choose(0).unwrap();
        let saved = session.store().load("bridge").unwrap().unwrap();
        assert_eq!(saved.current_passage, PassageId(2));
        assert!(saved.inventory.contains(&ItemId::from("rope")));
    }

    #[test]
    fn resumes_from_store() {
        let adv = adventure();
        let mut store = MemoryProgressStore::new();
        let inv: Inventory = [ItemId::from("rope")].into_iter().collect();
        store.save("bridge", PassageId(2), &inv).unwrap();

        let session = PlaySession::open(&adv, "bridge", store, SessionConfig::default()).unwrap();
        assert_eq!(session.state(), &PlayState::InPassage(PassageId(2)));
        assert_eq!(session.inventory_summary(), "Coil of rope");
    }

    #[test]
    fn stale_progress_is_discarded() {
        let adv = adventure();
        let mut store = MemoryProgressStore::new();
        store.save("bridge", PassageId(77), &Inventory::new()).unwrap();

        let session = PlaySession::open(&adv, "bridge", store, SessionConfig::default()).unwrap();
        assert_eq!(session.state(), &PlayState::Introduction);
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn store_failures_do_not_stop_play() {
        let adv = adventure();
        let mut session =
            PlaySession::open(&adv, "bridge", BrokenStore, SessionConfig::default()).unwrap();
        assert_eq!(session.warnings().len(), 1);

        session.start().unwrap();
        session.choose(1).unwrap();
        assert!(session.state().is_ended());
        session.restart().unwrap();
        assert_eq!(session.state(), &PlayState::InPassage(PassageId(1)));
        // load, start save, choose save, restart clear, restart save
        assert_eq!(session.warnings().len(), 5);
    }

    #[test]
    fn restart_clears_progress_and_inventory() {
        let adv = adventure();
        let mut session =
            PlaySession::open(&adv, "bridge", MemoryProgressStore::new(), SessionConfig::default())
                .unwrap();
        session.start().unwrap();
        session.choose(0).unwrap();
        assert_ne!(session.inventory_summary(), EMPTY_INVENTORY_LABEL);

        session.restart().unwrap();
        assert_eq!(session.inventory_summary(), EMPTY_INVENTORY_LABEL);
        let saved = session.store().load("bridge").unwrap().unwrap();
        assert_eq!(saved.current_passage, PassageId(1));
        assert!(saved.inventory.is_empty());
    }

    #[test]
    fn invalid_adventure_is_refused() {
        let adv = Adventure::new("Broken", &["..."])
            .with_passage(Passage::new(1, &["A."]).with_choice("Jump", 99));
        let result = PlaySession::open(&adv, "broken", MemoryProgressStore::new(), SessionConfig::default());
        assert!(matches!(result, Err(SessionError::Invalid(report)) if report.errors().count() == 1));
    }

    #[test]
    fn contract_violations_surface() {
        let adv = adventure();
        let mut session =
            PlaySession::open(&adv, "bridge", MemoryProgressStore::new(), SessionConfig::default())
                .unwrap();
        assert!(matches!(session.choose(0), Err(SessionError::Interpreter(_))));
        session.start().unwrap();
        assert!(matches!(session.choose(5), Err(SessionError::Interpreter(_))));
        assert_eq!(session.state(), &PlayState::InPassage(PassageId(1)));
    }

    #[test]
    fn debug_labels_and_autosave_off() {
        let adv = adventure();
        let config = SessionConfig::builder().debug_mode(true).autosave(false).build();
        let mut session = PlaySession::open(&adv, "bridge", MemoryProgressStore::new(), config).unwrap();
        assert!(session.choice_labels().is_empty());

        session.start().unwrap();
        assert_eq!(
            session.choice_labels(),
            vec!["Cross [-> 2]".to_string(), "Climb down [-> 3]".to_string()]
        );
        assert!(session.store().is_empty());

        session.set_debug_mode(false);
        assert_eq!(session.choice_labels()[0], "Cross");
    }
}
