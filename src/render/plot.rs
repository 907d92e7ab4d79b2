// src/render/plot.rs
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::info;

use super::colormap::{evaluate, normalize, BLUES};
use super::font::{draw_text, text_height, text_width};
use crate::error::NdwiError;
use crate::processing::band::Band;

const MARGIN: u32 = 16;
const BAR_GAP: u32 = 16;
const BAR_WIDTH: u32 = 16;
const TICK_LENGTH: u32 = 4;
const LABEL_GAP: u32 = 8;
/// The longest side of the map is never drawn smaller than this.
const MIN_MAP_SIZE: u32 = 256;
const MIN_BAR_HEIGHT: u32 = 128;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub title: String,
    pub label: String,
    pub vmin: f32,
    pub vmax: f32,
    /// Longest side of the map in pixels; larger scenes are subsampled.
    pub max_dimension: u32,
    pub text_scale: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: "Normalized Difference Water Index (NDWI)".to_string(),
            label: "NDWI".to_string(),
            vmin: -1.0,
            vmax: 1.0,
            max_dimension: 1024,
            text_scale: 2,
        }
    }
}

/// Size of the map area for a `rows x cols` grid.
fn map_size(rows: usize, cols: usize, max_dimension: u32) -> (u32, u32) {
    let longest = rows.max(cols) as f64;
    let upper = max_dimension.max(1) as f64;
    let target = longest.clamp((MIN_MAP_SIZE as f64).min(upper), upper);
    let factor = target / longest;

    let width = ((cols as f64 * factor).round() as u32).max(1);
    let height = ((rows as f64 * factor).round() as u32).max(1);
    (width, height)
}

fn format_tick(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Render an NDWI grid as a color-mapped image with a title and a labeled
/// color scale.
pub fn render_ndwi(ndwi: &Band, options: &PlotOptions) -> Result<RgbImage, NdwiError> {
    if ndwi.is_empty() {
        return Err(NdwiError::EmptyInput {
            band: "ndwi",
            rows: ndwi.rows(),
            cols: ndwi.cols(),
        });
    }

    let scale = options.text_scale.max(1);
    let (rows, cols) = ndwi.shape();
    let (map_width, map_height) = map_size(rows, cols, options.max_dimension);

    let ticks = [
        options.vmax,
        (options.vmin + options.vmax) / 2.0,
        options.vmin,
    ];
    let tick_labels: Vec<String> = ticks.iter().map(|&v| format_tick(v)).collect();
    let tick_label_width = tick_labels
        .iter()
        .map(|label| text_width(label, scale))
        .max()
        .unwrap_or(0);

    let map_x = MARGIN;
    let map_y = MARGIN + text_height(scale) + MARGIN;
    let bar_x = map_x + map_width + BAR_GAP;
    let bar_height = map_height.max(MIN_BAR_HEIGHT);
    let tick_label_x = bar_x + BAR_WIDTH + TICK_LENGTH + 4;
    let label_x = tick_label_x + tick_label_width + LABEL_GAP;

    let width = (label_x + text_width(&options.label, scale) + MARGIN)
        .max(MARGIN + text_width(&options.title, scale) + MARGIN);
    let height = map_y + map_height.max(bar_height) + MARGIN;

    let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

    draw_text(&mut image, MARGIN, MARGIN, &options.title, scale, INK);

    // Nearest-neighbour sampling of the grid into the map area
    for y in 0..map_height {
        let row = (y as usize * rows / map_height as usize).min(rows - 1);
        for x in 0..map_width {
            let col = (x as usize * cols / map_width as usize).min(cols - 1);
            let value = ndwi.data()[row * cols + col];
            let color = evaluate(BLUES, normalize(value, options.vmin, options.vmax));
            image.put_pixel(map_x + x, map_y + y, color);
        }
    }

    // Color scale, vmax at the top
    for y in 0..bar_height {
        let t = if bar_height > 1 {
            1.0 - y as f32 / (bar_height - 1) as f32
        } else {
            1.0
        };
        let color = evaluate(BLUES, t);
        for x in 0..BAR_WIDTH {
            image.put_pixel(bar_x + x, map_y + y, color);
        }
    }

    let glyph_height = text_height(scale);
    for (value, label) in ticks.iter().zip(&tick_labels) {
        let t = normalize(*value, options.vmin, options.vmax);
        let tick_y = map_y + ((1.0 - t) * (bar_height - 1) as f32).round() as u32;
        for x in 0..TICK_LENGTH {
            image.put_pixel(bar_x + BAR_WIDTH + x, tick_y, INK);
        }
        let text_y = tick_y.saturating_sub(glyph_height / 2).max(map_y);
        draw_text(&mut image, tick_label_x, text_y, label, scale, INK);
    }

    let label_y = map_y + bar_height / 2 - glyph_height / 2;
    draw_text(&mut image, label_x, label_y, &options.label, scale, INK);

    Ok(image)
}

/// Render and save the plot; the format follows the file extension.
pub fn save_plot(path: &Path, ndwi: &Band, options: &PlotOptions) -> Result<()> {
    let image = render_ndwi(ndwi, options)?;
    image
        .save(path)
        .with_context(|| format!("failed to save plot {}", path.display()))?;

    info!(path = %path.display(), width = image.width(), height = image.height(), "saved NDWI plot");
    Ok(())
}
