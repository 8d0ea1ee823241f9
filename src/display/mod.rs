pub mod segmenter;
pub mod palette;

pub use segmenter::*;
pub use palette::*;
