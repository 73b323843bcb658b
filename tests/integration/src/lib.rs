//! Integration test utilities for the reaction pipeline
//!
//! This crate provides a scripted in-process stand-in for the Web API, a
//! controllable clock and sleeper, and a harness that wires them into a real
//! SQLite-backed service context.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
