//! Layout engine: assign 2D drawing coordinates to every node.
//!
//! Two interchangeable strategies exist: [`LinearLayout`] for
//! rectangular trees and [`PolarLayout`] for circular ones. Both walk the
//! same tree model, store tree-space coordinates on the nodes, and return
//! a single scale factor converting branch-length units to canvas pixels.
//! The renderer only sees the shared [`LayoutEngine`] surface.

mod linear;
mod polar;

pub use linear::LinearLayout;
pub use polar::PolarLayout;

use enum_dispatch::enum_dispatch;
use glam::DVec2;

use crate::config::{Plot, TreeShape};
use crate::errors::RenderError;
use crate::render::MeasureText;
use crate::tree::{Tree, TreeNode};

/// The shared surface of both layout strategies.
#[enum_dispatch]
pub trait LayoutEngine {
    /// Assign coordinates to every node and derive the scale factor.
    ///
    /// The tip-label measurement callback must reflect the font the
    /// renderer will use: the scale depends on the widest tip label.
    fn layout(
        &self,
        tree: &mut Tree,
        plot: &Plot,
        measure: &dyn MeasureText,
    ) -> Result<f64, RenderError>;

    /// Transform a node's tree-space coordinates to canvas pixels.
    fn to_canvas(&self, node: &TreeNode, plot: &Plot, xscale: f64) -> DVec2;
}

/// A layout strategy, selected by tree shape.
#[enum_dispatch(LayoutEngine)]
pub enum Layout {
    Linear(LinearLayout),
    Polar(PolarLayout),
}

impl Layout {
    pub fn for_shape(shape: TreeShape) -> Layout {
        match shape {
            TreeShape::Rect => LinearLayout.into(),
            TreeShape::Radial => PolarLayout.into(),
        }
    }
}

/// Width of the widest tip label under the renderer's font.
pub(crate) fn widest_tip_label(tree: &Tree, plot: &Plot, measure: &dyn MeasureText) -> f64 {
    if plot.tip_name_size == 0.0 {
        return 1e-10;
    }
    tree.tips()
        .into_iter()
        .map(|id| measure.label_width(tree[id].label_str(), plot.tip_name_size))
        .fold(0.0, f64::max)
}

/// A usable scale factor is finite and positive; anything else means the
/// canvas cannot fit the tree.
pub(crate) fn validate_scale(value: f64) -> Result<f64, RenderError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RenderError::InvalidScale { value })
    }
}
