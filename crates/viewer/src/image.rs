//! Image post-processing: a color filter over the whole frame plus
//! per-material opacity.

use corelib::scene::Model;

/// Slider values: opacity in `0..=100`, the rest in `0..=200` (percent).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSettings {
    pub opacity: f32,
    pub saturate: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            opacity: 100.0,
            saturate: 100.0,
            contrast: 100.0,
            brightness: 100.0,
        }
    }
}

impl ImageSettings {
    /// Material opacity in `[0, 1]`.
    pub fn opacity_fraction(&self) -> f32 {
        (self.opacity / 100.0).clamp(0.0, 1.0)
    }

    pub fn filter(&self) -> ImageFilter {
        ImageFilter {
            saturate: self.saturate / 100.0,
            contrast: self.contrast / 100.0,
            brightness: self.brightness / 100.0,
        }
    }
}

/// Color filter applied to the composited frame, background included.
/// Factors are multipliers: `1.0` is the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageFilter {
    pub saturate: f32,
    pub contrast: f32,
    pub brightness: f32,
}

impl Default for ImageFilter {
    fn default() -> Self {
        ImageSettings::default().filter()
    }
}

impl ImageFilter {
    pub fn is_identity(&self) -> bool {
        self.saturate == 1.0 && self.contrast == 1.0 && self.brightness == 1.0
    }

    /// The same filter as a CSS `filter` value.
    pub fn css(&self) -> String {
        format!(
            "saturate({}%) contrast({}%) brightness({}%)",
            percent(self.saturate),
            percent(self.contrast),
            percent(self.brightness)
        )
    }
}

fn percent(factor: f32) -> f32 {
    (factor * 100.0).round()
}

/// Give every material of the model the slider opacity. Transparency turns
/// on below full opacity; depth writes stay on only above `depth_write_threshold`.
pub fn apply_opacity(model: &mut Model, settings: &ImageSettings, depth_write_threshold: f32) {
    let o = settings.opacity_fraction();
    for material in model.materials_mut() {
        material.transparent = o < 1.0;
        material.opacity = o;
        material.depth_write = o > depth_write_threshold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_identity() {
        let f = ImageSettings::default().filter();
        assert!(f.is_identity());
        assert_eq!(f.css(), "saturate(100%) contrast(100%) brightness(100%)");
    }

    #[test]
    fn css_reflects_sliders() {
        let s = ImageSettings {
            opacity: 50.0,
            saturate: 0.0,
            contrast: 150.0,
            brightness: 200.0,
        };
        assert_eq!(s.filter().css(), "saturate(0%) contrast(150%) brightness(200%)");
        assert_eq!(s.opacity_fraction(), 0.5);
    }
}
