// src/render/mod.rs
pub mod colormap;
pub mod font;
pub mod plot;

pub use plot::{render_ndwi, save_plot, PlotOptions};
