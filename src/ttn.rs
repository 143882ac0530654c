//! The TTN ("tree, tips, nodes") input format.
//!
//! A TTN file holds a Newick string followed by one state record per
//! line. Blank lines and lines starting with `#` or `[` are skipped, and
//! `#` starts a comment anywhere on a record line:
//!
//! ```text
//! # an example
//! ((A:1,B:2)ab:1,C:3);
//! A    0
//! B    1
//! C    0
//! ab   0.3 0.7   # reconstructed probabilities
//! ```

use miette::SourceSpan;

use crate::errors::{ParseError, SourceContext, StateError};
use crate::log::warn;
use crate::states::StateTable;

/// A TTN file split into its Newick string and state table.
#[derive(Debug, Clone)]
pub struct Ttn {
    /// The Newick tree description (first useful line of the file).
    pub newick: String,
    /// State records keyed by label.
    pub states: StateTable,
    /// Source context for downstream error reporting.
    pub context: SourceContext,
}

/// Lines that carry no data: blank, `#` comment, or `[` comment.
fn is_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with('[')
}

impl Ttn {
    /// Parse TTN text. The `name` labels the source in error reports.
    pub fn parse(name: &str, text: &str) -> Result<Self, miette::Report> {
        let context = SourceContext::new(name, text);

        let mut lines = text.lines();
        let mut offset = 0usize;

        // The first non-blank, non-comment line is the tree. Offsets
        // advance by the raw line length so record spans stay aligned.
        let newick = loop {
            let Some(line) = lines.next() else {
                return Err(ParseError::MissingTree.into());
            };
            offset += line.len() + 1;
            let trimmed = line.trim();
            if !is_comment(trimmed) {
                break trimmed.to_string();
            }
        };

        // Everything after it is `label value...` records.
        let mut states = StateTable::new();
        for line in lines {
            let line_start = offset;
            offset += line.len() + 1;

            let record = line.split('#').next().unwrap_or("").trim();
            if is_comment(record) {
                continue;
            }

            let malformed = || StateError::MalformedRecord {
                src: context.named_source(),
                span: SourceSpan::from((line_start, line.len())),
            };

            let mut fields = record.split_whitespace();
            let label = fields.next().ok_or_else(malformed)?;
            let values = fields
                .map(|field| field.parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|_| malformed())?;
            if values.is_empty() {
                return Err(malformed().into());
            }

            if states.insert(label.to_string(), values).is_some() {
                warn!("label '{}' is used more than once; keeping the last value", label);
            }
        }

        Ok(Ttn {
            newick,
            states,
            context,
        })
    }

    /// Read and parse a TTN file from disk.
    ///
    /// A missing or unreadable file is reported and halts processing;
    /// there is nothing to retry.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, miette::Report> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("can't open the file {}: {e}", path.display()))?;
        Self::parse(&path.display().to_string(), &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tree_and_records() {
        let text = "\
# a comment
[nexus-style comment]

((A:1,B:2)ab:1,C:3);
A  0
B  1
ab 0.3 0.7
";
        let ttn = Ttn::parse("<test>", text).unwrap();
        assert_eq!(ttn.newick, "((A:1,B:2)ab:1,C:3);");
        assert_eq!(ttn.states.len(), 3);
        assert_eq!(ttn.states["ab"], vec![0.3, 0.7]);
    }

    #[test]
    fn strips_trailing_comments_on_records() {
        let text = "(A:1,B:2);\nA 0 # observed\nB 1\n";
        let ttn = Ttn::parse("<test>", text).unwrap();
        assert_eq!(ttn.states["A"], vec![0.0]);
    }

    #[test]
    fn duplicate_label_keeps_last() {
        let text = "(A:1,B:2);\nA 0\nA 1\n";
        let ttn = Ttn::parse("<test>", text).unwrap();
        assert_eq!(ttn.states["A"], vec![1.0]);
    }

    #[test]
    fn missing_tree_is_an_error() {
        let err = Ttn::parse("<test>", "# only comments\n").unwrap_err();
        assert!(err.to_string().contains("no tree description"));
    }

    #[test]
    fn record_without_values_is_an_error() {
        let text = "(A:1,B:2);\nA\n";
        let err = Ttn::parse("<test>", text).unwrap_err();
        assert!(err.to_string().contains("malformed state record"));
    }

    #[test]
    fn unparsable_value_is_an_error() {
        let text = "(A:1,B:2);\nA zero\n";
        assert!(Ttn::parse("<test>", text).is_err());
    }

    #[test]
    fn record_spans_survive_padded_tree_line() {
        // Two spaces of padding around the tree line must not shift the
        // span reported for the bad record.
        let text = "  (A:1,B:2);  \nA 0\nB zero\n";
        let err = Ttn::parse("<test>", text).unwrap_err();
        match err.downcast_ref::<StateError>() {
            Some(StateError::MalformedRecord { span, .. }) => {
                assert_eq!(span.offset(), 19); // start of "B zero"
                assert_eq!(span.len(), 6);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn table_labels_absent_from_tree_are_tolerated() {
        let text = "(A:1,B:2);\nA 0\nGhost 1\n";
        let ttn = Ttn::parse("<test>", text).unwrap();
        assert!(ttn.states.contains_key("Ghost"));
    }
}
