pub mod ast;
pub mod tree;

pub use ast::*;
pub use tree::*;
