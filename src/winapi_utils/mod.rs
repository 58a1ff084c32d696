//! Safe wrappers around the Windows APIs the tracker needs: the
//! low-level keyboard hook and the message loop.

pub mod hooks;
pub mod message_loop;

pub use hooks::*;
pub use message_loop::*;
