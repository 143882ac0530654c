//! Render adapter boundary.
//!
//! The layout engine needs exactly one thing from the rendering
//! environment before it can run: the width of the widest tip label under
//! the chosen font. [`MeasureText`] is that callback. Everything else
//! flows the other way: the renderer reads final canvas coordinates,
//! states, and labels off the laid-out tree.

pub mod svg;

/// Text measurement callback supplied by a rendering backend.
pub trait MeasureText {
    /// Width of `text` in canvas units under the backend's font at
    /// `font_size`.
    fn label_width(&self, text: &str, font_size: f64) -> f64;
}

/// Character-count text measurement for backends without font metrics.
///
/// SVG leaves glyph metrics to the viewer, so the width is estimated as
/// a fixed fraction of the font size per character.
#[derive(Debug, Clone, Copy)]
pub struct CharWidthMeasure {
    /// Mean glyph width as a fraction of the font size.
    pub aspect: f64,
}

impl Default for CharWidthMeasure {
    fn default() -> Self {
        CharWidthMeasure { aspect: 0.6 }
    }
}

impl MeasureText for CharWidthMeasure {
    fn label_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.aspect
    }
}
