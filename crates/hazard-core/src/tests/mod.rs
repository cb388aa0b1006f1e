//! Engine-level tests.
//!
//! - `scenarios.rs`: end-to-end runs through the public operations
//! - `rules.rs`: one category rule or side effect at a time
//! - `exposure.rs`: what fields do to actors
//! - `emission.rs`: placing quantities of a field around a point
//! - `determinism.rs`: same seed, same state; save/restore round trips
//! - `properties.rs`: invariants over random placements and seeds
//! - `helpers.rs`: in-memory world collaborators and setup shortcuts

mod helpers;
mod scenarios;

// Re-export for convenience
pub use helpers::*;
