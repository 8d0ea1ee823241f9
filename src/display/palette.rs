//! Entity colour palette and frequency summary
//!
//! Entity types are numbered in the order they are first seen across a batch
//! and coloured by cycling through a fixed list of CSS classes. With more
//! types than classes, colours repeat.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::segmenter::EntitySpan;

const DEFAULT_CLASS_COUNT: usize = 8;

/// Count of spans for one entity type, with its assigned colour class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFrequency {
    pub entity_type: String,
    pub count: usize,
    pub color: String,
}

/// Per-batch entity summary in first-appearance order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub frequencies: Vec<EntityFrequency>,
}

impl EntitySummary {
    pub fn color_of(&self, entity_type: &str) -> Option<&str> {
        self.frequencies
            .iter()
            .find(|f| f.entity_type == entity_type)
            .map(|f| f.color.as_str())
    }

    pub fn count_of(&self, entity_type: &str) -> usize {
        self.frequencies
            .iter()
            .find(|f| f.entity_type == entity_type)
            .map_or(0, |f| f.count)
    }

    pub fn total(&self) -> usize {
        self.frequencies.iter().map(|f| f.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Fixed list of colour classes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPalette {
    classes: Vec<String>,
}

impl Default for EntityPalette {
    fn default() -> Self {
        Self {
            classes: Self::default_classes(),
        }
    }
}

impl EntityPalette {
    /// Palette from explicit classes; an empty list falls back to the defaults
    pub fn new(classes: Vec<String>) -> Self {
        if classes.is_empty() {
            return Self::default();
        }
        Self { classes }
    }

    pub fn default_classes() -> Vec<String> {
        (0..DEFAULT_CLASS_COUNT)
            .map(|i| format!("entity-color-{}", i))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Colour for the `index`-th distinct entity type
    pub fn color(&self, index: usize) -> &str {
        &self.classes[index % self.classes.len()]
    }

    /// Count spans per entity type in a single pass
    pub fn summarize<'a, I>(&self, spans: I) -> EntitySummary
    where
        I: IntoIterator<Item = &'a EntitySpan>,
    {
        let mut position: HashMap<&'a str, usize> = HashMap::new();
        let mut frequencies: Vec<EntityFrequency> = Vec::new();

        for span in spans {
            let entity_type = span.entity_type.as_str();
            match position.get(entity_type) {
                Some(&i) => frequencies[i].count += 1,
                None => {
                    let i = frequencies.len();
                    position.insert(entity_type, i);
                    frequencies.push(EntityFrequency {
                        entity_type: entity_type.to_string(),
                        count: 1,
                        color: self.color(i).to_string(),
                    });
                }
            }
        }

        EntitySummary { frequencies }
    }
}
