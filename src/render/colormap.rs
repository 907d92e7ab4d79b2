// src/render/colormap.rs
use image::Rgb;

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f32,
    pub color: [u8; 3],
}

impl ColorStop {
    pub const fn new(t: f32, r: u8, g: u8, b: u8) -> Self {
        Self { t, color: [r, g, b] }
    }
}

/// Sequential white-to-navy ramp (ColorBrewer "Blues").
pub const BLUES: &[ColorStop] = &[
    ColorStop::new(0.0, 247, 251, 255),
    ColorStop::new(0.125, 222, 235, 247),
    ColorStop::new(0.25, 198, 219, 239),
    ColorStop::new(0.375, 158, 202, 225),
    ColorStop::new(0.5, 107, 174, 214),
    ColorStop::new(0.625, 66, 146, 198),
    ColorStop::new(0.75, 33, 113, 181),
    ColorStop::new(0.875, 8, 81, 156),
    ColorStop::new(1.0, 8, 48, 107),
];

/// Map `value` from `[vmin, vmax]` to `[0, 1]`, clamping outside values.
/// Non-finite values map to 0.
pub fn normalize(value: f32, vmin: f32, vmax: f32) -> f32 {
    let range = vmax - vmin;
    if !value.is_finite() || range.abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - vmin) / range).clamp(0.0, 1.0)
}

/// Linear interpolation between the two stops surrounding `t`.
pub fn evaluate(stops: &[ColorStop], t: f32) -> Rgb<u8> {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    let Some(first) = stops.first() else {
        return Rgb([0, 0, 0]);
    };
    if t <= first.t {
        return Rgb(first.color);
    }

    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.t {
            let span = hi.t - lo.t;
            let f = if span > 0.0 { (t - lo.t) / span } else { 0.0 };
            let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * f).round() as u8;
            return Rgb([
                mix(lo.color[0], hi.color[0]),
                mix(lo.color[1], hi.color[1]),
                mix(lo.color[2], hi.color[2]),
            ]);
        }
    }

    Rgb(stops[stops.len() - 1].color)
}
