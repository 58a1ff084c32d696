//! Input observation.
//!
//! Keystroke classification, platform key translation, the permission
//! gate and (on Windows) the low-level keyboard hook.

pub mod key_filter;
pub mod keymap;
pub mod permission;

#[cfg(windows)]
pub mod input_hooks;

pub use key_filter::*;
pub use keymap::*;
pub use permission::*;

#[cfg(windows)]
pub use input_hooks::*;
