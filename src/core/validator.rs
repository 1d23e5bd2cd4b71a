/// Graph validator: structural and semantic checks on a story document.
///
/// Runs every check and collects all findings, so an author sees each
/// problem in a single pass. A document is playable when the report holds
/// no errors; unreachable passages are only warnings.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

use crate::schema::adventure::Adventure;
use crate::schema::item::{Effect, ItemId};
use crate::schema::passage::{Passage, PassageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Which family of problem a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    /// Duplicate or missing ids, dangling references, ending rules.
    Structural,
    /// Blank required text.
    Content,
    /// Contradictory effects within one passage.
    EffectConflict,
    /// Passage cannot be reached from the entry passage.
    Unreachable,
}

/// The part of the document a finding points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Subject {
    Title,
    Introduction,
    Passage(PassageId),
    Choice { passage: PassageId, index: usize },
    Effect { passage: PassageId, index: usize, item: ItemId },
    Item(ItemId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub category: Category,
    pub severity: Severity,
    pub subject: Subject,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered findings, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// True when no finding has `Error` severity.
    pub fn is_playable(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(move |v| v.category == category)
    }

    fn error(&mut self, category: Category, subject: Subject, message: String) {
        self.violations.push(Violation {
            category,
            severity: Severity::Error,
            subject,
            message,
        });
    }

    fn warning(&mut self, category: Category, subject: Subject, message: String) {
        self.violations.push(Violation {
            category,
            severity: Severity::Warning,
            subject,
            message,
        });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in &self.violations {
            let label = match v.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING",
            };
            writeln!(f, "{}: {}", label, v.message)?;
        }
        Ok(())
    }
}

/// Validate an adventure, returning every finding.
pub fn validate(adventure: &Adventure) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_uniqueness(adventure, &mut report);
    check_references(adventure, &mut report);
    check_terminals(adventure, &mut report);
    for passage in &adventure.passages {
        check_effects(passage, &mut report);
    }
    check_text(adventure, &mut report);
    check_reachability(adventure, &mut report);

    tracing::debug!(
        title = %adventure.title(),
        findings = report.violations.len(),
        "validated adventure"
    );
    report
}

fn check_uniqueness(adventure: &Adventure, report: &mut ValidationReport) {
    let mut seen_passages = FxHashSet::default();
    for passage in &adventure.passages {
        if !seen_passages.insert(passage.id) {
            report.error(
                Category::Structural,
                Subject::Passage(passage.id),
                format!("Passage id {} is used more than once", passage.id),
            );
        }
    }

    let mut seen_items = FxHashSet::default();
    for item in &adventure.items {
        if !seen_items.insert(&item.id) {
            report.error(
                Category::Structural,
                Subject::Item(item.id.clone()),
                format!("Item id '{}' is used more than once", item.id),
            );
        }
    }
}

fn check_references(adventure: &Adventure, report: &mut ValidationReport) {
    let passage_ids: FxHashSet<PassageId> = adventure.passage_ids().collect();
    let item_ids: FxHashSet<&ItemId> = adventure.items.iter().map(|i| &i.id).collect();

    if !passage_ids.contains(&PassageId::ENTRY) {
        report.error(
            Category::Structural,
            Subject::Passage(PassageId::ENTRY),
            format!("Entry passage {} is missing", PassageId::ENTRY),
        );
    }

    for passage in &adventure.passages {
        for (index, choice) in passage.choices.iter().enumerate() {
            if !passage_ids.contains(&choice.goto) {
                report.error(
                    Category::Structural,
                    Subject::Choice {
                        passage: passage.id,
                        index,
                    },
                    format!(
                        "Choice {} in passage {} leads to passage {}, which does not exist",
                        index + 1,
                        passage.id,
                        choice.goto
                    ),
                );
            }
        }

        for (index, effect) in passage.effects.iter().enumerate() {
            let item = effect.item();
            if !item_ids.contains(item) {
                report.error(
                    Category::Structural,
                    Subject::Effect {
                        passage: passage.id,
                        index,
                        item: item.clone(),
                    },
                    format!(
                        "Passage {} refers to item '{}', which does not exist",
                        passage.id, item
                    ),
                );
            }
        }
    }
}

fn check_terminals(adventure: &Adventure, report: &mut ValidationReport) {
    for passage in &adventure.passages {
        let has_ending = passage
            .ending_type
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty());

        if passage.is_terminal() && !has_ending {
            report.error(
                Category::Structural,
                Subject::Passage(passage.id),
                format!(
                    "Passage {} has no choices and no ending type",
                    passage.id
                ),
            );
        } else if !passage.is_terminal() && passage.ending_type.is_some() {
            report.error(
                Category::Structural,
                Subject::Passage(passage.id),
                format!(
                    "Passage {} has choices but also declares an ending type",
                    passage.id
                ),
            );
        }
    }
}

/// Only the first offending effect in list order is reported.
fn check_effects(passage: &Passage, report: &mut ValidationReport) {
    let mut added: FxHashSet<&ItemId> = FxHashSet::default();
    let mut removed: FxHashSet<&ItemId> = FxHashSet::default();

    for (index, effect) in passage.effects.iter().enumerate() {
        let problem = match effect {
            Effect::AddItem { item } => {
                if added.contains(item) {
                    Some("is added twice")
                } else if removed.contains(item) {
                    Some("is added and removed in the same passage")
                } else {
                    added.insert(item);
                    None
                }
            }
            Effect::RemoveItem { item } => {
                if removed.contains(item) {
                    Some("is removed twice")
                } else if added.contains(item) {
                    Some("is added and removed in the same passage")
                } else {
                    removed.insert(item);
                    None
                }
            }
        };

        if let Some(problem) = problem {
            let item = effect.item();
            report.error(
                Category::EffectConflict,
                Subject::Effect {
                    passage: passage.id,
                    index,
                    item: item.clone(),
                },
                format!("Item '{}' {} (passage {})", item, problem, passage.id),
            );
            return;
        }
    }
}

fn is_blank_block(paragraphs: &[String]) -> bool {
    paragraphs.iter().all(|p| p.trim().is_empty())
}

fn check_text(adventure: &Adventure, report: &mut ValidationReport) {
    if adventure.metadata.title.trim().is_empty() {
        report.error(
            Category::Content,
            Subject::Title,
            "Title must not be empty".to_string(),
        );
    }

    if is_blank_block(&adventure.introduction.paragraphs) {
        report.error(
            Category::Content,
            Subject::Introduction,
            "Introduction must not be empty".to_string(),
        );
    }

    for passage in &adventure.passages {
        if is_blank_block(&passage.paragraphs) {
            report.error(
                Category::Content,
                Subject::Passage(passage.id),
                format!("Passage {} has no text", passage.id),
            );
        }

        for (index, choice) in passage.choices.iter().enumerate() {
            if choice.text.trim().is_empty() {
                report.error(
                    Category::Content,
                    Subject::Choice {
                        passage: passage.id,
                        index,
                    },
                    format!("Choice {} in passage {} has no text", index + 1, passage.id),
                );
            }
        }
    }
}

fn check_reachability(adventure: &Adventure, report: &mut ValidationReport) {
    let mut edges: FxHashMap<PassageId, Vec<PassageId>> = FxHashMap::default();
    for passage in &adventure.passages {
        edges
            .entry(passage.id)
            .or_default()
            .extend(passage.choices.iter().map(|c| c.goto));
    }

    if !edges.contains_key(&PassageId::ENTRY) {
        // Already reported as a structural error; every passage would
        // otherwise show up as unreachable.
        return;
    }

    let mut reached = FxHashSet::default();
    let mut queue = VecDeque::from([PassageId::ENTRY]);
    reached.insert(PassageId::ENTRY);
    while let Some(id) = queue.pop_front() {
        for next in edges.get(&id).into_iter().flatten() {
            if edges.contains_key(next) && reached.insert(*next) {
                queue.push_back(*next);
            }
        }
    }

    let mut reported = FxHashSet::default();
    for passage in &adventure.passages {
        if !reached.contains(&passage.id) && reported.insert(passage.id) {
            report.warning(
                Category::Unreachable,
                Subject::Passage(passage.id),
                format!(
                    "Passage {} cannot be reached from passage {}",
                    passage.id,
                    PassageId::ENTRY
                ),
            );
        }
    }
}
