//! Generated NLU examples and the Rasa training-data shape

use serde::{Deserialize, Serialize};

use crate::display::EntitySpan;

/// One generated training example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NluExample {
    pub text: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
}

impl NluExample {
    pub fn new(text: impl Into<String>, intent: impl Into<String>, entities: Vec<EntitySpan>) -> Self {
        Self {
            text: text.into(),
            intent: intent.into(),
            entities,
        }
    }
}

/// `{ "rasa_nlu_data": { "common_examples": [...] } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasaPayload {
    pub rasa_nlu_data: RasaNluData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RasaNluData {
    #[serde(default)]
    pub common_examples: Vec<RasaExample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasaExample {
    pub text: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub entities: Vec<RasaEntity>,
}

/// Entity annotation as emitted by the generator (end is inclusive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasaEntity {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub value: String,
    pub entity: String,
}

impl From<RasaExample> for NluExample {
    fn from(example: RasaExample) -> Self {
        let entities = example
            .entities
            .into_iter()
            .map(|e| EntitySpan::new(e.start, e.end, e.entity))
            .collect();
        NluExample::new(example.text, example.intent, entities)
    }
}

impl From<&NluExample> for RasaExample {
    fn from(example: &NluExample) -> Self {
        let chars: Vec<char> = example.text.chars().collect();
        let entities = example
            .entities
            .iter()
            .map(|span| RasaEntity {
                start: span.start,
                end: span.end,
                value: chars
                    .get(span.start..=span.end)
                    .map(|slice| slice.iter().collect())
                    .unwrap_or_default(),
                entity: span.entity_type.clone(),
            })
            .collect();
        RasaExample {
            text: example.text.clone(),
            intent: example.intent.clone(),
            entities,
        }
    }
}
