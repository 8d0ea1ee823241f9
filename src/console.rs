//! Browser console logging
//!
//! Thin wrappers over `web_sys::console`. Imported JS functions cannot run on
//! native targets, so outside `wasm32` (unit tests) the calls are dropped.

/// Write an info line to the browser console
pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Write a warning line to the browser console
pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Write an error line to the browser console
pub fn error(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[macro_export]
macro_rules! console_log {
    ($($arg:tt)*) => {
        $crate::console::log(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_warn {
    ($($arg:tt)*) => {
        $crate::console::warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! console_error {
    ($($arg:tt)*) => {
        $crate::console::error(&format!($($arg)*))
    };
}
