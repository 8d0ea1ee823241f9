//! Client configuration

use serde::{Deserialize, Serialize};

use crate::display::EntityPalette;
use crate::grammar::DEFAULT_MAX_DEPTH;

/// Configuration for a MetonymStudio session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudioConfig {
    /// Parse service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Intent sent when the caller leaves it blank
    #[serde(default = "default_intent")]
    pub default_intent: String,
    /// Deepest syntax tree accepted from the parser
    #[serde(default = "default_max_tree_depth")]
    pub max_tree_depth: usize,
    /// Entity colour classes, cycled by first appearance
    #[serde(default = "EntityPalette::default_classes")]
    pub palette: Vec<String>,
}

fn default_endpoint() -> String {
    "./parse".to_string()
}

fn default_intent() -> String {
    "intent".to_string()
}

fn default_max_tree_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_intent: default_intent(),
            max_tree_depth: default_max_tree_depth(),
            palette: EntityPalette::default_classes(),
        }
    }
}
