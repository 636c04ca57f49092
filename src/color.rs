use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette
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
            to_color32(rgb)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential scale for heatmaps
// ---------------------------------------------------------------------------

/// Light-to-dark scale used for heatmap cells.
#[derive(Debug, Clone, Copy)]
pub struct HeatScale {
    low: LinSrgb,
    high: LinSrgb,
}

impl Default for HeatScale {
    fn default() -> Self {
        Self {
            low: Srgb::new(0.96_f32, 0.97, 1.0).into_linear(),
            high: Srgb::new(0.03_f32, 0.19, 0.42).into_linear(),
        }
    }
}

impl HeatScale {
    /// Colour for `count` relative to `max`; zero maps to the light end.
    pub fn color_for(&self, count: usize, max: usize) -> Color32 {
        let t = if max == 0 {
            0.0
        } else {
            (count as f32 / max as f32).clamp(0.0, 1.0)
        };
        to_color32(Srgb::from_linear(self.low.mix(self.high, t)))
    }

    /// Text colour that stays readable on top of [`Self::color_for`].
    pub fn text_color_for(&self, count: usize, max: usize) -> Color32 {
        if max > 0 && count * 2 > max {
            Color32::WHITE
        } else {
            Color32::BLACK
        }
    }
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}
