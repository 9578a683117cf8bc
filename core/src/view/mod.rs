//! Derived view model
//!
//! Pure functions from the in-memory task/project lists and the current
//! selection to what the UI renders.

mod filter;
mod stats;

pub use filter::*;
pub use stats::*;
