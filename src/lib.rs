//! Turns a tracker's per-application activity export and a user-maintained
//! process → tag table into a nested time-usage breakdown for a single day,
//! with a stable persisted color per tag and derived shades per process.
//!

pub mod cli;
pub mod color;
pub mod engine;
pub mod export;
pub mod utils;
