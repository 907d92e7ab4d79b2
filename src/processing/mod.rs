// src/processing/mod.rs
pub mod band;
pub mod indices;
pub mod job;
pub mod parallel;

// Re-export main components
pub use band::Band;
pub use job::NdwiJob;
pub use parallel::{BandSource, IndexCalculator, ParallelProcessor};
