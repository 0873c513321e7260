//! Nutrition normalization module
//!
//! Turns loosely-typed product records into fixed-shape display tables.

pub mod normalize;

pub use normalize::{normalize, round_half_even};
