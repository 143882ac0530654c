//! Rectangular layout: tips on parallel rows, x proportional to the
//! cumulative branch length from the root.

use glam::{DVec2, dvec2};

use crate::config::Plot;
use crate::errors::RenderError;
use crate::render::MeasureText;
use crate::tree::{NodeId, Tree, TreeNode};

use super::{LayoutEngine, validate_scale, widest_tip_label};

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearLayout;

impl LayoutEngine for LinearLayout {
    fn layout(
        &self,
        tree: &mut Tree,
        plot: &Plot,
        measure: &dyn MeasureText,
    ) -> Result<f64, RenderError> {
        let tip_label_width = widest_tip_label(tree, plot, measure);

        let mut xmax = -1.0f64;
        compute_xy(tree, tree.root(), 0.0, 0.5, &mut xmax);
        if xmax <= 0.0 {
            return Err(RenderError::NoExtent);
        }

        let available = plot.width
            - 2.0 * plot.xmargin
            - plot.tip_box_size
            - tip_label_width
            - plot.pie_radius;
        validate_scale(available / xmax)
    }

    fn to_canvas(&self, node: &TreeNode, plot: &Plot, xscale: f64) -> DVec2 {
        // Horizontal positions scale with branch length; vertical spacing
        // is a fixed row height, not a function of the tree.
        dvec2(
            plot.xmargin + plot.pie_radius + plot.line_thickness + node.x.unwrap_or(0.0) * xscale,
            plot.ymargin + node.y.unwrap_or(0.0) * plot.tip_spacing,
        )
    }
}

/// Post-order pass assigning `x` (cumulative branch length) and `y` (tip
/// row index, or the mean of the children's rows for internal nodes).
///
/// `i` is the next free tip row, threaded through the traversal in
/// left-to-right leaf order; the updated value is returned.
fn compute_xy(tree: &mut Tree, id: NodeId, x: f64, i: f64, xmax: &mut f64) -> f64 {
    let x = x + tree[id].branch_length.unwrap_or(0.0);
    tree[id].x = Some(x);
    if x > *xmax {
        *xmax = x;
    }

    let children = tree[id].children.clone();
    let mut i = i;
    for &c in &children {
        i = compute_xy(tree, c, x, i, xmax);
    }

    if children.is_empty() {
        tree[id].y = Some(i);
        i + 1.0
    } else {
        let sum: f64 = children.iter().map(|&c| tree[c].y.unwrap_or(0.0)).sum();
        tree[id].y = Some(sum / children.len() as f64);
        i
    }
}
