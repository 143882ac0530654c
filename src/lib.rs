//! Draw phylogenetic trees with ancestral-state pie charts.
//!
//! The input is a TTN file: a Newick tree description followed by one
//! state record per line. Tips get colored state boxes, internal nodes
//! get pie charts of their reconstructed state probabilities, and the
//! whole tree is drawn rectangular or radial as SVG.
//!
//! ```
//! use pietree::{pietree, Config};
//!
//! let ttn = "\
//! ((A:1,B:2)ab:1,C:3);
//! A   0
//! B   1
//! C   0
//! ab  0.3 0.7
//! ";
//! let svg = pietree(ttn, &Config::default()).unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```
//!
//! The pipeline behind [`pietree`] is exposed piecewise for callers that
//! want to intervene: [`Ttn::parse`] splits the input, [`newick::parse`]
//! builds the tree, [`states::annotate`] attaches states,
//! [`Config::resolve`] fixes the plot geometry, a [`layout::Layout`]
//! assigns coordinates, and [`render::svg::render`] writes the document.

mod log;

pub mod config;
pub mod errors;
pub mod layout;
pub mod newick;
pub mod render;
pub mod states;
pub mod tree;
pub mod ttn;

pub use config::{Color, Config, Plot, TreeShape};
pub use tree::{NodeId, State, Tree, TreeNode};
pub use ttn::Ttn;

use layout::{Layout, LayoutEngine};
use render::CharWidthMeasure;

/// Render TTN source to an SVG document.
///
/// Returns the SVG string on success, or an error with diagnostics.
pub fn pietree(source: &str, config: &Config) -> Result<String, miette::Report> {
    pietree_named("<input>", source, config)
}

/// Render TTN source, reporting errors against a named source.
pub fn pietree_named(name: &str, source: &str, config: &Config) -> Result<String, miette::Report> {
    let ttn = Ttn::parse(name, source)?;
    render_ttn(&ttn, config)
}

/// Read a TTN file from disk and render it.
pub fn pietree_file(
    path: impl AsRef<std::path::Path>,
    config: &Config,
) -> Result<String, miette::Report> {
    let ttn = Ttn::from_path(path)?;
    render_ttn(&ttn, config)
}

fn render_ttn(ttn: &Ttn, config: &Config) -> Result<String, miette::Report> {
    let mut tree = newick::parse_named(&ttn.context.name, &ttn.newick)?;
    let nstates = states::annotate(&mut tree, &ttn.states)?;
    tree.label_nodes();

    let ntips = tree.count_tips();
    let plot = config.resolve(ntips, nstates)?;
    let layout = Layout::for_shape(plot.shape);
    let xscale = layout.layout(&mut tree, &plot, &CharWidthMeasure::default())?;

    Ok(render::svg::render(&tree, &plot, &layout, xscale)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = "\
# three taxa, two states
((A:1,B:2)ab:1,C:3);
A   0
B   1
C   0
ab  0.3 0.7
";

    #[test]
    fn renders_default_config() {
        let svg = pietree(EXAMPLE, &Config::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn renders_radial_config() {
        let config = Config {
            shape: TreeShape::Radial,
            ..Config::default()
        };
        let svg = pietree(EXAMPLE, &config).unwrap();
        assert!(svg.contains("rotate("));
    }

    #[test]
    fn parse_error_is_reported_with_source_name() {
        let err = pietree_named("bad.ttn", "((A:1,B:2;\nA 0\nB 1\n", &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("mismatched ( )"));
    }

    #[test]
    fn missing_state_color_surfaces_from_resolve() {
        let ttn = "((A:1,B:2)ab:1,C:3);\nA 0\nB 1\nC 2\nab 0.2 0.3 0.5\n";
        let err = pietree(ttn, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("no color configured"));
    }
}
