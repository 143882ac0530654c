//! Error types with rich diagnostics using miette
//!
//! Parse errors carry source spans so a malformed Newick string is
//! pointed at directly in the report.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Source context for error reporting
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Name of the source (filename or "<input>")
    pub name: String,
    /// The full source text
    pub source: String,
}

impl SourceContext {
    /// Create a new source context
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Create a NamedSource for miette
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, self.source.clone())
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Errors raised while validating or parsing a Newick string
#[derive(Error, Diagnostic, Debug)]
pub enum ParseError {
    #[error("Newick string must end with a ';'")]
    #[diagnostic(code(pietree::parse::missing_terminator))]
    MissingTerminator {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected ';' here")]
        span: SourceSpan,
    },

    #[error("more than one ';' in Newick string")]
    #[diagnostic(code(pietree::parse::extra_terminator))]
    ExtraTerminator {
        #[source_code]
        src: NamedSource<String>,
        #[label("second ';' found here")]
        span: SourceSpan,
    },

    #[error("mismatched ( ) in Newick string: {open} opening vs {close} closing")]
    #[diagnostic(code(pietree::parse::unbalanced_parens))]
    UnbalancedParens {
        open: usize,
        close: usize,
        #[source_code]
        src: NamedSource<String>,
        #[label("in this string")]
        span: SourceSpan,
    },

    #[error("empty group '()' in Newick string")]
    #[diagnostic(code(pietree::parse::empty_group))]
    EmptyGroup {
        #[source_code]
        src: NamedSource<String>,
        #[label("empty group")]
        span: SourceSpan,
    },

    #[error("adjacent groups ')(' in Newick string")]
    #[diagnostic(
        code(pietree::parse::adjacent_groups),
        help("sibling groups must be separated by a comma")
    )]
    AdjacentGroups {
        #[source_code]
        src: NamedSource<String>,
        #[label("missing comma between groups")]
        span: SourceSpan,
    },

    #[error("invalid branch length: {text}")]
    #[diagnostic(code(pietree::parse::invalid_branch_length))]
    InvalidBranchLength {
        text: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("not a number")]
        span: SourceSpan,
    },

    #[error("unexpected '{found}' in Newick string")]
    #[diagnostic(code(pietree::parse::unexpected_token))]
    UnexpectedToken {
        found: char,
        #[source_code]
        src: NamedSource<String>,
        #[label("found this")]
        span: SourceSpan,
    },

    #[error("no tree description found in input")]
    #[diagnostic(
        code(pietree::parse::missing_tree),
        help("the first non-blank, non-comment line must be a Newick string ending in ';'")
    )]
    MissingTree,
}

// ============================================================================
// State Errors
// ============================================================================

/// Errors raised while attaching character states to the tree
#[derive(Error, Diagnostic, Debug)]
pub enum StateError {
    #[error("tip '{label}' must have exactly one state value, got {found}")]
    #[diagnostic(code(pietree::state::tip_value_count))]
    TipValueCount { label: String, found: usize },

    #[error("tip '{label}' has state {value} outside [0, {nstates})")]
    #[diagnostic(code(pietree::state::tip_state_range))]
    TipStateRange {
        label: String,
        value: f64,
        nstates: usize,
    },

    #[error("node '{label}' has {found} state probabilities, expected {expected}")]
    #[diagnostic(code(pietree::state::vector_length))]
    VectorLength {
        label: String,
        found: usize,
        expected: usize,
    },

    #[error("state probabilities for '{label}' sum to {sum}, not 1")]
    #[diagnostic(
        code(pietree::state::bad_sum),
        help("probabilities must sum to 1 within a tolerance of 0.01; they are not renormalized")
    )]
    BadSum { label: String, sum: f64 },

    #[error("malformed state record")]
    #[diagnostic(
        code(pietree::state::malformed_record),
        help("proper format is e.g.:\n   label1   value1\n   label2   value2")
    )]
    MalformedRecord {
        #[source_code]
        src: NamedSource<String>,
        #[label("cannot parse this line")]
        span: SourceSpan,
    },
}

// ============================================================================
// Config Errors
// ============================================================================

/// Errors raised while resolving the plot configuration
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("no color configured for state {state} (tree uses {nstates} states)")]
    #[diagnostic(
        code(pietree::config::missing_state_color),
        help("supply one color per state, e.g. \"(0, 0.5, 0.7)\"")
    )]
    MissingStateColor { state: usize, nstates: usize },

    #[error("invalid color: {text}")]
    #[diagnostic(
        code(pietree::config::bad_color),
        help("RGB colors should be specified like this: \"(0, 0.5, 0.7)\"")
    )]
    BadColor { text: String },
}

// ============================================================================
// Render Errors
// ============================================================================

/// Errors raised while scaling or drawing the laid-out tree
#[derive(Error, Diagnostic, Debug)]
pub enum RenderError {
    #[error("invalid scale factor: {value}")]
    #[diagnostic(
        code(pietree::render::invalid_scale),
        help("the canvas is too small for the margins, pie radius, and tip labels")
    )]
    InvalidScale { value: f64 },

    #[error("tree has no extent: every branch length is zero or missing")]
    #[diagnostic(code(pietree::render::no_extent))]
    NoExtent,

    #[error("node has no layout coordinates; run the layout pass first")]
    #[diagnostic(code(pietree::render::missing_coordinates))]
    MissingCoordinates,
}
