use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::FieldValue;

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
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Diverging scale for the correlation heatmap
// ---------------------------------------------------------------------------

/// Map a correlation coefficient in [-1, 1] onto a blue–white–red scale,
/// white at zero.
pub fn diverging(t: f32) -> Color32 {
    let t = t.clamp(-1.0, 1.0);
    let cold = LinSrgb::new(0.16_f32, 0.28, 0.73);
    let warm = LinSrgb::new(0.70_f32, 0.05, 0.12);
    let white = LinSrgb::new(1.0_f32, 1.0, 1.0);

    let mixed = if t < 0.0 {
        white.mix(cold, -t)
    } else {
        white.mix(warm, t)
    };
    let srgb: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
    Color32::from_rgb(srgb.red, srgb.green, srgb.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: field value → Color32
// ---------------------------------------------------------------------------

/// Maps unique values of a chosen column to distinct colours, so a category
/// keeps its colour across every chart of the dashboard.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<FieldValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a column's unique values.
    pub fn new(unique_values: &std::collections::BTreeSet<FieldValue>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<FieldValue, Color32> = unique_values
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &FieldValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_size_matches_request() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(5).len(), 5);
    }

    #[test]
    fn diverging_endpoints_lean_the_right_way() {
        let neg = diverging(-1.0);
        let zero = diverging(0.0);
        let pos = diverging(1.0);

        assert!(neg.b() > neg.r());
        assert!(pos.r() > pos.b());
        assert_eq!(zero, Color32::from_rgb(255, 255, 255));
    }

    #[test]
    fn unknown_values_fall_back_to_the_default() {
        let values = [FieldValue::String("Dropout".into())].into();
        let cm = ColorMap::new(&values);
        assert_eq!(cm.color_for(&FieldValue::Integer(9)), Color32::GRAY);
        assert_ne!(
            cm.color_for(&FieldValue::String("Dropout".into())),
            Color32::GRAY
        );
    }
}
