use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct product categories to distinct colours so bars and
/// scatter points stay consistently coloured across all charts.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from the sorted distinct values of a dimension.
    pub fn new(values: &BTreeSet<String>) -> Self {
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<String, Color32> = values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Heatmap ramps
// ---------------------------------------------------------------------------

/// Diverging blue→white→red ramp for correlation cells, `t` in `[-1, 1]`.
pub fn diverging_color(t: f64) -> Color32 {
    let t = t.clamp(-1.0, 1.0);
    let blue = (33, 102, 172);
    let red = (178, 24, 43);
    let toward = if t < 0.0 { blue } else { red };
    let a = t.abs() as f32;
    let lerp = |from: u8, to: u8| (from as f32 + (to as f32 - from as f32) * a) as u8;
    Color32::from_rgb(
        lerp(255, toward.0),
        lerp(255, toward.1),
        lerp(255, toward.2),
    )
}

/// Sequential dark-blue→green→yellow ramp for revenue cells, `t` in `[0, 1]`.
pub fn sequential_color(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    // Hue sweeps 250° (deep blue) down to 80° (yellow-green) while
    // brightening, roughly viridis-shaped.
    let hue = 250.0 - 170.0 * t;
    hsl_to_color32(Hsl::new(hue, 0.65, 0.25 + 0.45 * t))
}

/// Black or white, whichever reads better on the given background.
pub fn contrast_text(background: Color32) -> Color32 {
    let luma = 0.299 * background.r() as f32
        + 0.587 * background.g() as f32
        + 0.114 * background.b() as f32;
    if luma > 140.0 {
        Color32::BLACK
    } else {
        Color32::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colors() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(8);
        assert_eq!(p.len(), 8);
        let unique: std::collections::BTreeSet<_> =
            p.iter().map(|c| (c.r(), c.g(), c.b())).collect();
        assert_eq!(unique.len(), 8);
    }

    #[test]
    fn color_map_falls_back_for_unknown_values() {
        let values: BTreeSet<String> = ["A".to_string(), "B".to_string()].into();
        let cm = ColorMap::new(&values);
        assert_ne!(cm.color_for("A"), cm.color_for("B"));
        assert_eq!(cm.color_for("unknown"), Color32::GRAY);
    }

    #[test]
    fn diverging_ramp_is_white_at_zero() {
        assert_eq!(diverging_color(0.0), Color32::from_rgb(255, 255, 255));
        assert_ne!(diverging_color(-1.0), diverging_color(1.0));
    }
}
