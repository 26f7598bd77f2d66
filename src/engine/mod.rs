pub mod distractor;
pub mod pool;
pub mod sampler;
pub mod scoring;

pub use pool::{CombinationPool, FactPair};
