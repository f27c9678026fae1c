//! Keyframe skeletal animation core.
//!
//! Computes the local rotation, position and scale of every bone in a model each tick by
//! running one or more animation controllers and relaxing undriven bones back to their
//! bind pose. Asset loading and rendering live outside this crate.

#![forbid(unsafe_code)]

mod easing;
mod error;
pub mod expression;
mod model;
mod runtime;

pub use easing::*;
pub use error::*;
pub use model::*;
pub use runtime::*;

#[cfg(test)]
mod easing_tests;
