//! Append-only record of what the opponent could have known at each decision
//! boundary: a battle-state snapshot plus our own chosen decision.

use crate::model::decision::Decision;

#[derive(Debug, Clone)]
pub struct EvidenceEntry<S> {
    state: S,
    own_decision: Option<Decision>,
}

impl<S> EvidenceEntry<S> {
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn own_decision(&self) -> Option<&Decision> {
        self.own_decision.as_ref()
    }
}

/// Grows for the life of the battle and is never truncated; particles keep a
/// cursor into it instead of copying it.
#[derive(Debug, Clone, Default)]
pub struct EvidenceLog<S> {
    entries: Vec<EvidenceEntry<S>>,
}

impl<S> EvidenceLog<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&EvidenceEntry<S>> {
        self.entries.get(index)
    }

    /// Opens a new entry with the state snapshot taken at a decision boundary.
    pub fn record_state(&mut self, state: S) {
        self.entries.push(EvidenceEntry {
            state,
            own_decision: None,
        });
    }

    /// Attaches our decision to the newest entry. Returns false when there is
    /// no open entry or the decision was already recorded.
    pub fn record_own_decision(&mut self, decision: Decision) -> bool {
        match self.entries.last_mut() {
            Some(entry) if entry.own_decision.is_none() => {
                entry.own_decision = Some(decision);
                true
            }
            _ => false,
        }
    }
}
