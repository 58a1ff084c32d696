//! Session state and WPM aggregation.
//!
//! The [`SessionEngine`] is constructed once by the composition root and
//! owned by the tracker thread; nothing here is a process-wide global.

pub mod aggregator;
pub mod clock;
pub mod session_engine;
pub mod types;

pub use aggregator::*;
pub use clock::*;
pub use session_engine::*;
pub use types::*;
