// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_band, RasterProfile};
pub use writer::{write_ndwi, WriterOptions};
