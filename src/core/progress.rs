/// Progress store: per-adventure persistence of position and inventory.
///
/// The core never talks to a storage substrate directly; it goes through
/// [`ProgressStore`]. [`MemoryProgressStore`] backs tests,
/// [`FileProgressStore`] keeps one JSON file per adventure, and
/// [`ObservedStore`] wraps either to notify subscribers after each
/// successful write.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::interpreter::Inventory;
use crate::schema::passage::PassageId;

#[derive(Debug, Error)]
pub enum PersistenceFailure {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt progress record for '{adventure_id}': {reason}")]
    Corrupt {
        adventure_id: String,
        reason: String,
    },
}

/// A reader's saved position in one adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub adventure_id: String,
    pub current_passage: PassageId,
    pub inventory: Inventory,
}

/// Persistence contract for reader progress, keyed by adventure id.
///
/// Callers issue at most one call at a time per adventure id.
pub trait ProgressStore {
    /// Saved progress, or `None` on a first visit.
    fn load(&self, adventure_id: &str) -> Result<Option<Progress>, PersistenceFailure>;

    fn save(
        &mut self,
        adventure_id: &str,
        current_passage: PassageId,
        inventory: &Inventory,
    ) -> Result<(), PersistenceFailure>;

    /// Forget any saved progress. Clearing an absent record succeeds.
    fn clear(&mut self, adventure_id: &str) -> Result<(), PersistenceFailure>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for Box<S> {
    fn load(&self, adventure_id: &str) -> Result<Option<Progress>, PersistenceFailure> {
        (**self).load(adventure_id)
    }

    fn save(
        &mut self,
        adventure_id: &str,
        current_passage: PassageId,
        inventory: &Inventory,
    ) -> Result<(), PersistenceFailure> {
        (**self).save(adventure_id, current_passage, inventory)
    }

    fn clear(&mut self, adventure_id: &str) -> Result<(), PersistenceFailure> {
        (**self).clear(adventure_id)
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    records: FxHashMap<String, Progress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, adventure_id: &str) -> Result<Option<Progress>, PersistenceFailure> {
        Ok(self.records.get(adventure_id).cloned())
    }

    fn save(
        &mut self,
        adventure_id: &str,
        current_passage: PassageId,
        inventory: &Inventory,
    ) -> Result<(), PersistenceFailure> {
        self.records.insert(
            adventure_id.to_string(),
            Progress {
                adventure_id: adventure_id.to_string(),
                current_passage,
                inventory: inventory.clone(),
            },
        );
        Ok(())
    }

    fn clear(&mut self, adventure_id: &str) -> Result<(), PersistenceFailure> {
        self.records.remove(adventure_id);
        Ok(())
    }
}

/// File-name suffix of every record written by [`FileProgressStore`].
pub const PROGRESS_FILE_SUFFIX: &str = ".progress.json";

/// True for files written by [`FileProgressStore`], which are JSON but not
/// story documents.
pub fn is_progress_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(PROGRESS_FILE_SUFFIX))
}

/// Stores each adventure's progress as `<dir>/<sanitized id>.progress.json`.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    dir: PathBuf,
}

impl FileProgressStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceFailure> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, adventure_id: &str) -> PathBuf {
        let stem: String = adventure_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}{}", stem, PROGRESS_FILE_SUFFIX))
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, adventure_id: &str) -> Result<Option<Progress>, PersistenceFailure> {
        let path = self.path_for(adventure_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let progress: Progress = serde_json::from_str(&contents)?;
        // Sanitized file names can collide; never hand back another
        // adventure's record.
        if progress.adventure_id != adventure_id {
            return Err(PersistenceFailure::Corrupt {
                adventure_id: adventure_id.to_string(),
                reason: format!("file belongs to '{}'", progress.adventure_id),
            });
        }
        Ok(Some(progress))
    }

    fn save(
        &mut self,
        adventure_id: &str,
        current_passage: PassageId,
        inventory: &Inventory,
    ) -> Result<(), PersistenceFailure> {
        let progress = Progress {
            adventure_id: adventure_id.to_string(),
            current_passage,
            inventory: inventory.clone(),
        };
        let serialized = serde_json::to_string_pretty(&progress)?;
        std::fs::write(self.path_for(adventure_id), serialized)?;
        Ok(())
    }

    fn clear(&mut self, adventure_id: &str) -> Result<(), PersistenceFailure> {
        match std::fs::remove_file(self.path_for(adventure_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Emitted by [`ObservedStore`] after a write succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Saved(Progress),
    Cleared { adventure_id: String },
}

/// Handle returned by [`ObservedStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ProgressEvent)>;

/// Wraps a store and notifies subscribers after each successful `save` or
/// `clear`. Failed writes notify nobody.
pub struct ObservedStore<S> {
    inner: S,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl<S: ProgressStore> ObservedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ProgressEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn notify(&mut self, event: ProgressEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}

impl<S: ProgressStore> ProgressStore for ObservedStore<S> {
    fn load(&self, adventure_id: &str) -> Result<Option<Progress>, PersistenceFailure> {
        self.inner.load(adventure_id)
    }

    fn save(
        &mut self,
        adventure_id: &str,
        current_passage: PassageId,
        inventory: &Inventory,
    ) -> Result<(), PersistenceFailure> {
        self.inner.save(adventure_id, current_passage, inventory)?;
        self.notify(ProgressEvent::Saved(Progress {
            adventure_id: adventure_id.to_string(),
            current_passage,
            inventory: inventory.clone(),
        }));
        Ok(())
    }

    fn clear(&mut self, adventure_id: &str) -> Result<(), PersistenceFailure> {
        self.inner.clear(adventure_id)?;
        self.notify(ProgressEvent::Cleared {
            adventure_id: adventure_id.to_string(),
        });
        Ok(())
    }
}
