//! Text preparation for embedding: cleaning and bounded-size chunking.

pub mod chunk;
pub mod clean;

pub use chunk::split;
pub use clean::clean;
