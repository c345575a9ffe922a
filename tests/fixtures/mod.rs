//! Test fixtures for tour-planner.
//!
//! Provides realistic test data including:
//! - Real towns of the Godavari / Krishna delta (from OpenStreetMap)
//! - Stub distance oracles with scripted answers

pub mod delta_towns;
pub mod oracles;

pub use delta_towns::*;
pub use oracles::*;
