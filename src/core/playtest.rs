/// Playtest simulation: seeded random walks through an adventure.
///
/// Each run starts at the introduction and picks uniformly among the
/// choices on offer until it reaches an ending or runs out of steps. The
/// report tells an author which endings are actually reachable in practice
/// and which items a reader never picks up.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

use crate::core::interpreter::{Interpreter, InterpreterError, PlayState, Snapshot};
use crate::schema::adventure::Adventure;
use crate::schema::item::ItemId;
use crate::schema::passage::PassageId;

#[derive(Debug, Clone, Copy)]
pub struct Playtester {
    pub runs: u32,
    pub seed: u64,
    /// Choices made before a run is abandoned as stuck in a loop.
    pub max_steps: u32,
}

impl Default for Playtester {
    fn default() -> Self {
        Self {
            runs: 100,
            seed: 42,
            max_steps: 500,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaytestReport {
    pub runs: u32,
    /// Ending type -> number of runs that finished there.
    pub endings: BTreeMap<String, u32>,
    /// Runs that hit `max_steps` without reaching an ending.
    pub unfinished: u32,
    /// Total choices made across all runs.
    pub steps: u64,
    pub visited: FxHashSet<PassageId>,
    /// Declared items no run ever held.
    pub items_never_held: Vec<ItemId>,
}

impl PlaytestReport {
    pub fn average_steps(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.steps as f64 / self.runs as f64
        }
    }

    /// Passages no run ever entered, in authored order.
    pub fn never_visited(&self, adventure: &Adventure) -> Vec<PassageId> {
        adventure
            .passage_ids()
            .filter(|id| !self.visited.contains(id))
            .collect()
    }
}

impl Playtester {
    /// Run the simulation. The adventure is expected to have passed
    /// validation; a contract violation aborts the whole playtest.
    pub fn run(&self, adventure: &Adventure) -> Result<PlaytestReport, InterpreterError> {
        let interp = Interpreter::new(adventure);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut endings: FxHashMap<String, u32> = FxHashMap::default();
        let mut held: FxHashSet<ItemId> = FxHashSet::default();
        let mut report = PlaytestReport {
            runs: self.runs,
            ..PlaytestReport::default()
        };

        for _ in 0..self.runs {
            let mut snapshot = interp.start(&Snapshot::default())?;
            let mut steps = 0;

            loop {
                if let Some(id) = snapshot.state.passage_id() {
                    report.visited.insert(id);
                }
                held.extend(snapshot.inventory.iter().cloned());

                match &snapshot.state {
                    PlayState::Ended { ending_type, .. } => {
                        *endings.entry(ending_type.clone()).or_default() += 1;
                        break;
                    }
                    _ if steps >= self.max_steps => {
                        report.unfinished += 1;
                        break;
                    }
                    _ => {}
                }

                let available = interp
                    .current_passage(&snapshot)
                    .map_or(0, |p| p.choices.len());
                if available == 0 {
                    // Terminal passage without an ending type.
                    report.unfinished += 1;
                    break;
                }
                snapshot = interp.choose(&snapshot, rng.gen_range(0..available))?;
                steps += 1;
            }
            report.steps += u64::from(steps);
        }

        report.endings = endings.into_iter().collect();
        report.items_never_held = adventure
            .items
            .iter()
            .filter(|item| !held.contains(&item.id))
            .map(|item| item.id.clone())
            .collect();

        tracing::debug!(
            runs = report.runs,
            unfinished = report.unfinished,
            endings = report.endings.len(),
            "playtest complete"
        );
        Ok(report)
    }
}
