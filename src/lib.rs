//! Metonym Studio: client core for an NLU training-data generator
//!
//! Sends grammar source to the parse service, then turns the reply into
//! something a page can render and curate.
//!
//! # Architecture
//!
//! ## Display
//! - `segmenter.rs` - EntitySegmenter: example text + entity spans -> plain/entity segments
//! - `palette.rs` - Entity frequency summary and colour classes
//!
//! ## Curation
//! - `identity.rs` - IdentityAssigner: 36-char alphanumeric example identities
//! - `selection.rs` - SelectionStore: per-example `included` flags for the current batch
//! - `sampler.rs` - CurationSampler: Bernoulli sampling over the batch
//! - `output.rs` - OutputSet: accumulated examples in Rasa NLU form
//!
//! ## Grammar
//! - `ast.rs` - Parser AST wire shape and arena
//! - `tree.rs` - ASTTreeBuilder: AST -> renderer hierarchy, rejecting cycles and runaway depth
//!
//! ## Session
//! - `controller.rs` - ParseController: Idle -> Requesting -> Succeeded/Failed, latest request wins
//! - `wasm.rs` - `MetonymStudio` JavaScript handle
//!
//! # Usage (WASM)
//! ```javascript,ignore
//! import init, { MetonymStudio } from 'metonym-studio';
//!
//! await init();
//! const studio = new MetonymStudio(null);
//!
//! const view = await studio.parse('(Hi|Hello) (Bob):name', 'greet');
//! console.log(view.tree);      // { label, tag, children }
//! console.log(view.examples);  // [{ identity, segments, included, ... }]
//! ```

pub mod console;
pub mod curation;
pub mod display;
pub mod grammar;
pub mod session;

pub use curation::*;
pub use display::*;
pub use grammar::*;
pub use session::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("metonym-studio v{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_names_crate() {
        assert!(version().starts_with("metonym-studio v"));
    }
}
