//! SVG generation
//!
//! Reads canvas coordinates, states, and labels off the laid-out tree and
//! assembles an SVG document: forks, ancestral-state pies, tip state
//! boxes, and text labels. In radial mode, pies, boxes, and labels are
//! rotated to the node's angle with a `translate(...) rotate(...)` group,
//! mirroring the transform stack a raster backend would use.

use std::f64::consts::PI;

use glam::{DVec2, dvec2};

use crate::config::{Color, Plot, TreeShape};
use crate::errors::RenderError;
use crate::layout::{Layout, LayoutEngine};
use crate::log::warn;
use crate::tree::{NodeId, State, Tree};

/// Render the laid-out tree as a complete SVG document.
pub fn render(tree: &Tree, plot: &Plot, layout: &Layout, xscale: f64) -> Result<String, RenderError> {
    let root = tree.root();
    if tree[root].x.is_none() || tree[root].y.is_none() {
        return Err(RenderError::MissingCoordinates);
    }

    let mut writer = SvgWriter {
        tree,
        plot,
        layout,
        xscale,
        out: String::new(),
    };
    writer.document();
    Ok(writer.out)
}

struct SvgWriter<'a> {
    tree: &'a Tree,
    plot: &'a Plot,
    layout: &'a Layout,
    xscale: f64,
    out: String,
}

/// Compact fixed-point formatting for SVG attribute values.
fn n(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Escape text content for XML.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl SvgWriter<'_> {
    fn document(&mut self) {
        let plot = self.plot;
        self.out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = n(plot.width),
            h = n(plot.height),
        ));
        if let Some(back) = plot.back_color {
            self.out.push_str(&format!(
                "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>\n",
                n(plot.width),
                n(plot.height),
                back.to_rgb_string(),
            ));
        }

        self.draw_root_branch();
        self.plot_node(self.tree.root());

        self.out.push_str("</svg>\n");
    }

    fn point(&self, id: NodeId) -> DVec2 {
        self.layout.to_canvas(&self.tree[id], self.plot, self.xscale)
    }

    /// Canvas point for arbitrary tree-space coordinates.
    fn tree_point(&self, x: f64, y: f64) -> DVec2 {
        let plot = self.plot;
        match plot.shape {
            TreeShape::Rect => dvec2(
                plot.xmargin + plot.pie_radius + plot.line_thickness + x * self.xscale,
                plot.ymargin + y * plot.tip_spacing,
            ),
            TreeShape::Radial => dvec2(
                x * self.xscale + plot.width / 2.0,
                y * self.xscale + plot.height / 2.0,
            ),
        }
    }

    fn plot_node(&mut self, id: NodeId) {
        if self.tree[id].is_tip() {
            self.draw_tip(id);
            return;
        }

        self.draw_fork(id);

        if self.plot.pie_radius > 0.0 {
            match &self.tree[id].state {
                Some(State::Probs(probs)) => {
                    let probs = probs.clone();
                    self.draw_pie(id, &probs);
                }
                Some(State::Tip(_)) | None => {
                    warn!("state not specified for '{}'", self.tree[id].label_str());
                }
            }
        }
        if self.plot.node_name_size > 0.0 {
            self.draw_node_label(id);
        }

        for c in self.tree[id].children.clone() {
            self.plot_node(c);
        }
    }

    fn stroke_attrs(&self, width: f64) -> String {
        format!(
            "fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
            self.plot.line_color.to_rgb_string(),
            n(width),
        )
    }

    /// The branch leading to the root, rectangular layouts only.
    fn draw_root_branch(&mut self) {
        if self.plot.shape != TreeShape::Rect {
            return;
        }
        let root = self.tree.root();
        let p = self.point(root);
        let base = self.tree_point(0.0, self.tree[root].y.unwrap_or(0.0));
        self.out.push_str(&format!(
            "<path d=\"M {} {} L {} {}\" {}/>\n",
            n(p.x),
            n(p.y),
            n(base.x),
            n(base.y),
            self.stroke_attrs(self.plot.line_thickness),
        ));
    }

    /// The fork from a node to its children.
    fn draw_fork(&mut self, id: NodeId) {
        match self.plot.shape {
            TreeShape::Rect => self.draw_fork_rect(id),
            TreeShape::Radial => self.draw_fork_radial(id),
        }
    }

    fn draw_fork_rect(&mut self, id: NodeId) {
        let p0 = self.point(id);
        for &d in &self.tree[id].children {
            let p = self.point(d);
            self.out.push_str(&format!(
                "<path d=\"M {} {} L {} {} L {} {}\" {}/>\n",
                n(p0.x),
                n(p0.y),
                n(p0.x),
                n(p.y),
                n(p.x),
                n(p.y),
                self.stroke_attrs(self.plot.line_thickness),
            ));
        }
    }

    /// Radial fork: a spoke out to each child plus an arc along the
    /// node's own radius spanning the children's angles.
    fn draw_fork_radial(&mut self, id: NodeId) {
        let node = &self.tree[id];
        let r = node.r.unwrap_or(0.0);

        let (mut min_t, mut max_t) = (2.0 * PI, 0.0f64);
        for &d in &node.children {
            let t = self.tree[d].theta.unwrap_or(0.0);
            min_t = min_t.min(t);
            max_t = max_t.max(t);

            let child = self.point(d);
            let elbow = self.tree_point(r * t.cos(), r * t.sin());
            self.out.push_str(&format!(
                "<path d=\"M {} {} L {} {}\" {}/>\n",
                n(child.x),
                n(child.y),
                n(elbow.x),
                n(elbow.y),
                self.stroke_attrs(self.plot.line_thickness),
            ));
        }

        let arc_r = r * self.xscale;
        if arc_r <= 0.0 || max_t <= min_t {
            return;
        }
        let center = dvec2(self.plot.width / 2.0, self.plot.height / 2.0);
        let start = center + arc_r * dvec2(min_t.cos(), min_t.sin());
        let end = center + arc_r * dvec2(max_t.cos(), max_t.sin());
        let large = if max_t - min_t > PI { 1 } else { 0 };
        self.out.push_str(&format!(
            "<path d=\"M {} {} A {} {} 0 {} 1 {} {}\" {}/>\n",
            n(start.x),
            n(start.y),
            n(arc_r),
            n(arc_r),
            large,
            n(end.x),
            n(end.y),
            self.stroke_attrs(self.plot.line_thickness),
        ));
    }

    /// Pie chart of the reconstructed state probabilities at a node.
    fn draw_pie(&mut self, id: NodeId, probs: &[f64]) {
        let plot = self.plot;
        let p = self.point(id);
        let radius = plot.pie_radius;

        let (center, rotated) = match plot.shape {
            TreeShape::Rect => (p, false),
            TreeShape::Radial => {
                let deg = self.tree[id].theta.unwrap_or(0.0).to_degrees();
                self.out.push_str(&format!(
                    "<g transform=\"translate({} {}) rotate({})\">\n",
                    n(p.x),
                    n(p.y),
                    n(deg),
                ));
                (DVec2::ZERO, true)
            }
        };

        // Outer circle of the pie.
        if plot.rim_thickness > 0.0 {
            self.out.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>\n",
                n(center.x),
                n(center.y),
                n(radius),
                self.stroke_attrs(plot.rim_thickness),
            ));
        }

        // The pie pieces, clockwise from 12 o'clock.
        let mut angle_start = -PI / 2.0;
        for (i, &frac) in probs.iter().enumerate() {
            let angle_stop = frac * 2.0 * PI + angle_start;
            let color = plot.state_color(i).unwrap_or(Color::GRAY);
            self.wedge(center, radius, angle_start, angle_stop, color);
            angle_start = angle_stop;
        }

        if rotated {
            self.out.push_str("</g>\n");
        }
    }

    fn wedge(&mut self, c: DVec2, radius: f64, a0: f64, a1: f64, color: Color) {
        let sweep = a1 - a0;
        if sweep <= 0.0 {
            return;
        }
        if sweep >= 2.0 * PI - 1e-9 {
            // A full-circle arc degenerates in SVG; emit a disc.
            self.out.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>\n",
                n(c.x),
                n(c.y),
                n(radius),
                color.to_rgb_string(),
            ));
            return;
        }
        let p0 = c + radius * dvec2(a0.cos(), a0.sin());
        let p1 = c + radius * dvec2(a1.cos(), a1.sin());
        let large = if sweep > PI { 1 } else { 0 };
        self.out.push_str(&format!(
            "<path d=\"M {} {} L {} {} A {} {} 0 {} 1 {} {} Z\" fill=\"{}\"/>\n",
            n(c.x),
            n(c.y),
            n(p0.x),
            n(p0.y),
            n(radius),
            n(radius),
            large,
            n(p1.x),
            n(p1.y),
            color.to_rgb_string(),
        ));
    }

    /// Fill color of a tip's state box.
    fn tip_color(&self, id: NodeId) -> Color {
        match self.tree[id].state {
            Some(State::Tip(s)) => match self.plot.state_color(s) {
                Some(color) => color,
                None => {
                    warn!("check the state of '{}'", self.tree[id].label_str());
                    Color::GRAY
                }
            },
            _ => {
                warn!("check the state of '{}'", self.tree[id].label_str());
                Color::GRAY
            }
        }
    }

    /// The tip box, border, and label.
    fn draw_tip(&mut self, id: NodeId) {
        let plot = self.plot;
        let p = self.point(id);
        let delta = plot.tip_box_size;
        let fill = self.tip_color(id);

        let stroke = if plot.rim_thickness > 0.0 && delta > 0.0 {
            format!(
                " stroke=\"{}\" stroke-width=\"{}\"",
                plot.line_color.to_rgb_string(),
                n(plot.rim_thickness),
            )
        } else {
            String::new()
        };

        match plot.shape {
            TreeShape::Rect => {
                if delta > 0.0 {
                    self.out.push_str(&format!(
                        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>\n",
                        n(p.x - delta / 2.0),
                        n(p.y - delta / 2.0),
                        n(delta),
                        n(delta),
                        fill.to_rgb_string(),
                        stroke,
                    ));
                }
                self.tip_label(id, p, delta, fill);
            }
            TreeShape::Radial => {
                let deg = self.tree[id].theta.unwrap_or(0.0).to_degrees();
                self.out.push_str(&format!(
                    "<g transform=\"translate({} {}) rotate({})\">\n",
                    n(p.x),
                    n(p.y),
                    n(deg),
                ));
                if delta > 0.0 {
                    self.out.push_str(&format!(
                        "<rect x=\"0\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"{}/>\n",
                        n(-delta / 2.0),
                        n(delta),
                        n(delta),
                        fill.to_rgb_string(),
                        stroke,
                    ));
                }
                // The label offset doubles in radial mode: the box grows
                // outward from the node instead of being centered on it.
                self.tip_label(id, DVec2::ZERO, delta * 2.0, fill);
                self.out.push_str("</g>\n");
            }
        }
    }

    fn tip_label(&mut self, id: NodeId, p: DVec2, delta: f64, state_color: Color) {
        let plot = self.plot;
        if plot.tip_name_size <= 0.0 {
            return;
        }
        let Some(label) = self.tree[id].label.clone() else {
            return;
        };
        let color = if plot.tip_name_state_color {
            state_color
        } else {
            plot.text_color
        };
        let text_height = plot.tip_name_size * 0.7;
        self.text(
            p.x + delta / 2.0 + plot.tip_spacing / 4.0,
            p.y + text_height / 3.0,
            plot.tip_name_size,
            color,
            &label,
        );
    }

    /// The text label by an internal node.
    fn draw_node_label(&mut self, id: NodeId) {
        let plot = self.plot;
        let Some(label) = self.tree[id].label.clone() else {
            return;
        };
        let p = self.point(id);
        let text_height = plot.node_name_size * 0.7;
        let offset = dvec2(
            plot.pie_radius + plot.tip_spacing / 5.0,
            text_height / 2.0,
        );

        match plot.shape {
            TreeShape::Rect => {
                self.text(p.x + offset.x, p.y + offset.y, plot.node_name_size, plot.text_color, &label);
            }
            TreeShape::Radial => {
                let deg = self.tree[id].theta.unwrap_or(0.0).to_degrees();
                self.out.push_str(&format!(
                    "<g transform=\"translate({} {}) rotate({})\">\n",
                    n(p.x),
                    n(p.y),
                    n(deg),
                ));
                self.text(offset.x, offset.y, plot.node_name_size, plot.text_color, &label);
                self.out.push_str("</g>\n");
            }
        }
    }

    fn text(&mut self, x: f64, y: f64, size: f64, color: Color, label: &str) {
        let plot = self.plot;
        let shown = if plot.underscore_space {
            label.replace('_', " ")
        } else {
            label.to_string()
        };
        let family = if plot.serif { "serif" } else { "sans-serif" };
        let style = if plot.italic { " font-style=\"italic\"" } else { "" };
        self.out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"{}\" font-family=\"{}\"{} fill=\"{}\">{}</text>\n",
            n(x),
            n(y),
            n(size),
            family,
            style,
            color.to_rgb_string(),
            escape(&shown),
        ));
    }
}
