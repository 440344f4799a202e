//! Domain layer types and invariants.

pub mod normalize;
pub mod posts;
pub mod types;
