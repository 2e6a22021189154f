//! Built-in effect-entity definitions for the scoring engine.

mod entities;
pub mod registry;

pub use registry::*;
