pub mod config;
pub mod protocol;
pub mod controller;
pub mod transport;
pub mod wasm;

pub use config::*;
pub use protocol::*;
pub use controller::*;
pub use transport::*;
pub use wasm::*;
