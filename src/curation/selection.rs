//! SelectionStore: per-example curation state for the current batch
//!
//! Holds exactly the examples of the most recent `load`, each keyed by a
//! fresh identity and carrying an `included` flag. Loading a new batch
//! replaces the previous one wholesale.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::example::NluExample;
use super::identity::{Identity, IdentityAssigner};

// =============================================================================
// Types
// =============================================================================

/// Curation state for one example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub identity: Identity,
    pub example: NluExample,
    pub included: bool,
}

/// Render-facing view of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub identity: Identity,
    pub included: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("unknown example identity: {0}")]
    UnknownIdentity(Identity),
    #[error("probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
}

// =============================================================================
// SelectionStore
// =============================================================================

pub struct SelectionStore {
    assigner: IdentityAssigner,
    order: Vec<Identity>,
    entries: HashMap<Identity, SelectionEntry>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(IdentityAssigner::new())
    }
}

impl SelectionStore {
    pub fn new(assigner: IdentityAssigner) -> Self {
        Self {
            assigner,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Replace the batch. Every example gets a fresh identity and starts included.
    ///
    /// Returns the identities in input order.
    pub fn load(&mut self, examples: Vec<NluExample>) -> Vec<Identity> {
        self.clear();
        self.order.reserve(examples.len());
        self.entries.reserve(examples.len());

        for example in examples {
            let identity = self.assigner.assign();
            self.order.push(identity.clone());
            self.entries.insert(
                identity.clone(),
                SelectionEntry {
                    identity,
                    example,
                    included: true,
                },
            );
        }

        self.order.clone()
    }

    /// Drop the current batch
    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    pub fn set_included(&mut self, identity: &str, included: bool) -> Result<(), SelectionError> {
        let entry = self
            .entries
            .get_mut(identity)
            .ok_or_else(|| SelectionError::UnknownIdentity(identity.to_string()))?;
        entry.included = included;
        Ok(())
    }

    pub fn set_all_included(&mut self, included: bool) {
        for entry in self.entries.values_mut() {
            entry.included = included;
        }
    }

    /// Set every entry's flag from `decide`, visiting entries in batch order
    pub fn update_each<F>(&mut self, mut decide: F)
    where
        F: FnMut(&SelectionEntry) -> bool,
    {
        for identity in &self.order {
            if let Some(entry) = self.entries.get_mut(identity) {
                entry.included = decide(entry);
            }
        }
    }

    /// `(identity, included)` pairs in batch order
    pub fn snapshot(&self) -> Vec<SelectionState> {
        self.entries()
            .map(|entry| SelectionState {
                identity: entry.identity.clone(),
                included: entry.included,
            })
            .collect()
    }

    /// Entries in batch order
    pub fn entries(&self) -> impl Iterator<Item = &SelectionEntry> + '_ {
        self.order.iter().filter_map(move |id| self.entries.get(id))
    }

    pub fn get(&self, identity: &str) -> Option<&SelectionEntry> {
        self.entries.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    pub fn is_included(&self, identity: &str) -> Option<bool> {
        self.entries.get(identity).map(|entry| entry.included)
    }

    pub fn included_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.included).count()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether identity draws have fallen back from the platform source
    pub fn entropy_degraded(&self) -> bool {
        self.assigner.entropy_degraded()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
