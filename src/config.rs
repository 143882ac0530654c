//! Plot configuration: canvas geometry, colors, fonts, and the cascade
//! of defaults that fills in anything the user left unset.

use std::str::FromStr;

use crate::errors::ConfigError;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Color = Color { r: 0.0, g: 0.0, b: 0.0 };
    /// Fallback for tips whose state is missing or out of range.
    pub const GRAY: Color = Color { r: 0.5, g: 0.5, b: 0.5 };

    /// CSS `rgb(...)` form for SVG attributes.
    pub fn to_rgb_string(self) -> String {
        let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("rgb({},{},{})", channel(self.r), channel(self.g), channel(self.b))
    }
}

/// Parse a `"(r, g, b)"` triplet with components in `[0, 1]`.
impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::BadColor { text: s.to_string() };

        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(bad)?;

        let parts: Vec<&str> = inner.split(',').collect();
        if parts.len() != 3 {
            return Err(bad());
        }
        let mut channels = [0.0f64; 3];
        for (slot, part) in channels.iter_mut().zip(&parts) {
            *slot = part.trim().parse::<f64>().map_err(|_| bad())?;
        }
        Ok(Color {
            r: channels[0],
            g: channels[1],
            b: channels[2],
        })
    }
}

/// Overall tree shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeShape {
    /// Rectangular (cladogram): tips on parallel rows.
    #[default]
    Rect,
    /// Radial (circular): tips around a circle.
    Radial,
}

/// User-facing plot options. `None` fields are filled by [`Config::resolve`]
/// using the same cascade of defaults as the plot variables they depend on.
#[derive(Debug, Clone)]
pub struct Config {
    /// Width of the entire picture, in pixels.
    pub width: f64,
    /// Height of the picture; defaults from the tip count (rect) or width (radial).
    pub height: Option<f64>,
    /// Margin on the left and right.
    pub xmargin: f64,
    /// Margin on the top and bottom.
    pub ymargin: f64,
    /// Radius of the node reconstruction pie charts.
    pub pie_radius: f64,
    /// Height of the tip state box; defaults from the pie radius.
    pub tip_box_size: Option<f64>,
    /// Spacing between tip box centers; defaults from the box size.
    pub tip_spacing: Option<f64>,
    /// Thickness of connecting lines.
    pub line_thickness: f64,
    /// Thickness of pie and tip box borders; defaults to the line thickness.
    pub rim_thickness: Option<f64>,
    /// Font size of tip names; defaults from the box size.
    pub tip_name_size: Option<f64>,
    /// Font size of node names; defaults from the tip name size.
    pub node_name_size: Option<f64>,
    /// Rectangular or radial layout.
    pub shape: TreeShape,
    /// One color per state, indexed by state number.
    pub colors: Vec<Color>,
    /// Color of tip and node labels.
    pub text_color: Color,
    /// Color of connecting lines.
    pub line_color: Color,
    /// Background color; `None` leaves the canvas transparent.
    pub back_color: Option<Color>,
    /// Write tip names in their state colors instead of `text_color`.
    pub tip_name_state_color: bool,
    /// Replace `_` with a space in displayed labels.
    pub underscore_space: bool,
    /// Use a serif font face.
    pub serif: bool,
    /// Use an italic font face.
    pub italic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: 800.0,
            height: None,
            xmargin: 10.0,
            ymargin: 10.0,
            pie_radius: 7.0,
            tip_box_size: None,
            tip_spacing: None,
            line_thickness: 1.0,
            rim_thickness: None,
            tip_name_size: None,
            node_name_size: None,
            shape: TreeShape::Rect,
            colors: vec![Color::WHITE, Color::BLACK],
            text_color: Color::BLACK,
            line_color: Color::BLACK,
            back_color: None,
            tip_name_state_color: false,
            underscore_space: false,
            serif: false,
            italic: false,
        }
    }
}

impl Config {
    /// Resolve every optional value into a concrete [`Plot`].
    ///
    /// `ntips` drives the default canvas height; `nstates` is checked
    /// against the configured colors so a missing state color fails here,
    /// before any drawing starts.
    pub fn resolve(&self, ntips: usize, nstates: usize) -> Result<Plot, ConfigError> {
        if nstates > self.colors.len() {
            return Err(ConfigError::MissingStateColor {
                state: self.colors.len(),
                nstates,
            });
        }

        let tip_box_size = self.tip_box_size.unwrap_or(if self.pie_radius == 0.0 {
            10.0
        } else {
            self.pie_radius * 1.9
        });

        let tip_name_size = self
            .tip_name_size
            .unwrap_or(if tip_box_size == 0.0 { 10.0 } else { tip_box_size });

        let node_name_size = self.node_name_size.unwrap_or(if tip_name_size == 0.0 {
            8.0
        } else {
            tip_name_size * 0.75
        });

        let tip_spacing = self.tip_spacing.unwrap_or_else(|| {
            if tip_box_size == 0.0 && self.pie_radius > 0.0 {
                self.pie_radius * 3.0
            } else if tip_box_size == 0.0 {
                if tip_name_size > 0.0 { tip_name_size * 1.5 } else { 10.0 }
            } else {
                tip_box_size * 1.5
            }
        });

        let rim_thickness = self.rim_thickness.unwrap_or(self.line_thickness);

        let height = self.height.unwrap_or(match self.shape {
            TreeShape::Rect => ntips as f64 * tip_spacing + 2.0 * self.ymargin,
            TreeShape::Radial => self.width,
        });

        Ok(Plot {
            width: self.width,
            height,
            xmargin: self.xmargin,
            ymargin: self.ymargin,
            pie_radius: self.pie_radius,
            tip_box_size,
            tip_spacing,
            line_thickness: self.line_thickness,
            rim_thickness,
            tip_name_size,
            node_name_size,
            shape: self.shape,
            colors: self.colors.clone(),
            text_color: self.text_color,
            line_color: self.line_color,
            back_color: self.back_color,
            tip_name_state_color: self.tip_name_state_color,
            underscore_space: self.underscore_space,
            serif: self.serif,
            italic: self.italic,
        })
    }
}

/// Fully-resolved plot variables, as consumed by layout and rendering.
#[derive(Debug, Clone)]
pub struct Plot {
    pub width: f64,
    pub height: f64,
    pub xmargin: f64,
    pub ymargin: f64,
    pub pie_radius: f64,
    pub tip_box_size: f64,
    pub tip_spacing: f64,
    pub line_thickness: f64,
    pub rim_thickness: f64,
    pub tip_name_size: f64,
    pub node_name_size: f64,
    pub shape: TreeShape,
    pub colors: Vec<Color>,
    pub text_color: Color,
    pub line_color: Color,
    pub back_color: Option<Color>,
    pub tip_name_state_color: bool,
    pub underscore_space: bool,
    pub serif: bool,
    pub italic: bool,
}

impl Plot {
    /// Color for a discrete state, if one is configured.
    pub fn state_color(&self, state: usize) -> Option<Color> {
        self.colors.get(state).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rgb_triplet() {
        let c: Color = "(0, 0.5, 0.7)".parse().unwrap();
        assert_eq!(c, Color { r: 0.0, g: 0.5, b: 0.7 });
        assert_eq!(c.to_rgb_string(), "rgb(0,128,179)");
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!("0, 0.5, 0.7".parse::<Color>().is_err());
        assert!("(0, 0.5)".parse::<Color>().is_err());
        assert!("(a, b, c)".parse::<Color>().is_err());
    }

    #[test]
    fn default_cascade_from_pie_radius() {
        let plot = Config::default().resolve(4, 2).unwrap();
        assert!((plot.tip_box_size - 13.3).abs() < 1e-9); // 7 * 1.9
        assert_eq!(plot.tip_name_size, plot.tip_box_size);
        assert!((plot.node_name_size - plot.tip_name_size * 0.75).abs() < 1e-9);
        assert!((plot.tip_spacing - plot.tip_box_size * 1.5).abs() < 1e-9);
        assert_eq!(plot.rim_thickness, plot.line_thickness);
        // rect height: ntips * spacing + 2 * ymargin
        assert!((plot.height - (4.0 * plot.tip_spacing + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn radial_height_defaults_to_width() {
        let config = Config {
            shape: TreeShape::Radial,
            ..Config::default()
        };
        let plot = config.resolve(4, 2).unwrap();
        assert_eq!(plot.height, plot.width);
    }

    #[test]
    fn missing_state_color_is_an_error() {
        let err = Config::default().resolve(4, 3).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingStateColor { state: 2, nstates: 3 }
        ));
    }
}
