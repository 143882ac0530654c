//! Radial layout: tips around a circle, distance from the center
//! proportional to the cumulative branch length from the root.

use std::f64::consts::PI;

use glam::{DVec2, dvec2};

use crate::config::Plot;
use crate::errors::RenderError;
use crate::render::MeasureText;
use crate::tree::{NodeId, Tree, TreeNode};

use super::{LayoutEngine, validate_scale, widest_tip_label};

#[derive(Debug, Clone, Copy, Default)]
pub struct PolarLayout;

impl LayoutEngine for PolarLayout {
    fn layout(
        &self,
        tree: &mut Tree,
        plot: &Plot,
        measure: &dyn MeasureText,
    ) -> Result<f64, RenderError> {
        let tip_label_width = widest_tip_label(tree, plot, measure);
        let ntips = tree.count_tips();

        let mut rmax = -1.0f64;
        compute_r_theta(tree, tree.root(), 0.0, 0, &mut rmax, ntips);
        if rmax <= 0.0 {
            return Err(RenderError::NoExtent);
        }

        // Cartesian conversion runs as a separate pass once every r and
        // theta is final.
        rt_to_xy(tree, tree.root());

        let available = plot.width
            - 2.0 * plot.xmargin
            - 2.0 * plot.tip_box_size
            - 2.0 * tip_label_width
            - 2.0 * plot.pie_radius;
        validate_scale(available / (2.0 * rmax))
    }

    fn to_canvas(&self, node: &TreeNode, plot: &Plot, xscale: f64) -> DVec2 {
        // Centered on the canvas; the margins are absorbed into the
        // scale, not the transform.
        dvec2(
            node.x.unwrap_or(0.0) * xscale + plot.width / 2.0,
            node.y.unwrap_or(0.0) * xscale + plot.height / 2.0,
        )
    }
}

/// Post-order pass assigning `r` (cumulative branch length) and `theta`
/// (evenly spread tip angles; the mean of the children's angles for
/// internal nodes). `i` is the next tip index, threaded through in
/// left-to-right leaf order.
///
/// The internal-node angle is a plain arithmetic mean of the raw radian
/// values, not a circular mean: when a node's children straddle the
/// 0/2π boundary the result is geometrically wrong. Known limitation.
fn compute_r_theta(
    tree: &mut Tree,
    id: NodeId,
    r: f64,
    i: usize,
    rmax: &mut f64,
    ntips: usize,
) -> usize {
    let r = r + tree[id].branch_length.unwrap_or(0.0);
    tree[id].r = Some(r);
    if r > *rmax {
        *rmax = r;
    }

    let children = tree[id].children.clone();
    let mut i = i;
    for &c in &children {
        i = compute_r_theta(tree, c, r, i, rmax, ntips);
    }

    if children.is_empty() {
        tree[id].theta = Some(2.0 * PI * i as f64 / ntips as f64);
        i + 1
    } else {
        let sum: f64 = children.iter().map(|&c| tree[c].theta.unwrap_or(0.0)).sum();
        tree[id].theta = Some(sum / children.len() as f64);
        i
    }
}

/// Convert every node's polar coordinates to Cartesian.
fn rt_to_xy(tree: &mut Tree, root: NodeId) {
    for id in tree.preorder(root) {
        let r = tree[id].r.unwrap_or(0.0);
        let theta = tree[id].theta.unwrap_or(0.0);
        tree[id].x = Some(r * theta.cos());
        tree[id].y = Some(r * theta.sin());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, TreeShape};
    use crate::newick;
    use crate::render::CharWidthMeasure;

    fn laid_out(input: &str) -> (Tree, Plot, f64) {
        let mut tree = newick::parse(input).unwrap();
        let config = Config {
            shape: TreeShape::Radial,
            ..Config::default()
        };
        let plot = config.resolve(tree.count_tips(), 2).unwrap();
        let scale = PolarLayout
            .layout(&mut tree, &plot, &CharWidthMeasure::default())
            .unwrap();
        (tree, plot, scale)
    }

    #[test]
    fn radius_matches_cartesian_norm() {
        let (tree, _, _) = laid_out("(((a:1,b:1):1,c:2):1,d:3);");
        for id in tree.preorder(tree.root()) {
            let node = &tree[id];
            let norm = (node.x.unwrap().powi(2) + node.y.unwrap().powi(2)).sqrt();
            assert!((norm - node.r.unwrap()).abs() < 1e-9);
        }
    }

    #[test]
    fn root_sits_at_origin() {
        let (tree, _, _) = laid_out("((a:1,b:1):1,c:2);");
        let root = &tree[tree.root()];
        assert_eq!(root.r, Some(0.0));
        assert_eq!(root.x, Some(0.0));
        assert_eq!(root.y, Some(0.0));
    }

    #[test]
    fn tips_are_evenly_spread() {
        let (tree, _, _) = laid_out("((a:1,b:1):1,(c:1,d:1):1);");
        let thetas: Vec<f64> = tree.tips().iter().map(|&id| tree[id].theta.unwrap()).collect();
        for (i, theta) in thetas.iter().enumerate() {
            assert!((theta - 2.0 * PI * i as f64 / 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn internal_theta_is_arithmetic_mean() {
        let (tree, _, _) = laid_out("((a:1,b:1):1,c:2);");
        let root = tree.root();
        let ab = tree[root].children[0];
        let a = tree[ab].children[0];
        let b = tree[ab].children[1];
        assert_eq!(
            tree[ab].theta.unwrap(),
            (tree[a].theta.unwrap() + tree[b].theta.unwrap()) / 2.0
        );
    }

    #[test]
    fn canvas_transform_is_centered() {
        let (tree, plot, scale) = laid_out("((a:1,b:1):1,c:2);");
        let root = tree.root();
        let p = PolarLayout.to_canvas(&tree[root], &plot, scale);
        assert_eq!(p.x, plot.width / 2.0);
        assert_eq!(p.y, plot.height / 2.0);
    }
}
