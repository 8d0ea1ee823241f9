//! OutputSet: curator-approved examples
//!
//! Materialized from the included entries of a SelectionStore when the
//! curator asks for it. Keyed by identity, so adding the same selection
//! twice does not duplicate anything.

use std::collections::HashMap;

use super::example::{NluExample, RasaExample, RasaNluData, RasaPayload};
use super::identity::Identity;
use super::selection::SelectionStore;

#[derive(Debug, Clone, Default)]
pub struct OutputSet {
    order: Vec<Identity>,
    examples: HashMap<Identity, NluExample>,
}

impl OutputSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every included entry of `store`; returns how many were new
    pub fn add_included(&mut self, store: &SelectionStore) -> usize {
        let mut added = 0;
        for entry in store.entries().filter(|entry| entry.included) {
            if self.examples.contains_key(&entry.identity) {
                continue;
            }
            self.order.push(entry.identity.clone());
            self.examples.insert(entry.identity.clone(), entry.example.clone());
            added += 1;
        }
        added
    }

    pub fn remove(&mut self, identity: &str) -> bool {
        if self.examples.remove(identity).is_none() {
            return false;
        }
        self.order.retain(|id| id != identity);
        true
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.examples.contains_key(identity)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.examples.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(identity, example)` pairs in the order they were first added
    pub fn entries(&self) -> impl Iterator<Item = (&Identity, &NluExample)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.examples.get(id).map(|example| (id, example)))
    }

    pub fn examples(&self) -> Vec<&NluExample> {
        self.entries().map(|(_, example)| example).collect()
    }

    /// Rasa training-data view of the output
    pub fn to_rasa(&self) -> RasaPayload {
        RasaPayload {
            rasa_nlu_data: RasaNluData {
                common_examples: self.entries().map(|(_, example)| RasaExample::from(example)).collect(),
            },
        }
    }
}
