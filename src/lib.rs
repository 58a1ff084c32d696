//! wpmon - Typing Speed Tracker
//!
//! Counts countable keystrokes into sessions and reports words per minute.
//! The session engine and keystroke filter are platform independent; the
//! keyboard hook and tray icon are Windows only.

pub mod config;
pub mod error;
pub mod instance;
pub mod monitor;
pub mod store;
pub mod tracker;

#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod winapi_utils;
