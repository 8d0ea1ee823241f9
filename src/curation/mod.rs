pub mod entropy;
pub mod identity;
pub mod example;
pub mod selection;
pub mod sampler;
pub mod output;

pub use entropy::*;
pub use identity::*;
pub use example::*;
pub use selection::*;
pub use sampler::*;
pub use output::*;
