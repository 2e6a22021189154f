//! Effect resolution and scoring engine. Keep this crate free of IO and
//! platform concerns.

pub mod cards;
pub mod clamp;
pub mod container;
pub mod context;
pub mod copy;
pub mod dispatch;
pub mod entity;
pub mod hand;
pub mod result;
pub mod rng;
pub mod scoring;

pub use cards::*;
pub use clamp::*;
pub use container::*;
pub use context::*;
pub use copy::*;
pub use dispatch::*;
pub use entity::*;
pub use hand::*;
pub use result::*;
pub use rng::*;
pub use scoring::*;
