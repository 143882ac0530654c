//! Newick parsing: structural validation followed by a cursor scan.
//!
//! [`check`] rejects malformed strings up front; [`parse`] never allocates
//! tree nodes for invalid input. The scanner walks the string character by
//! character, maintaining a "current node" cursor: `(` descends into a new
//! child, `,` and `)` ascend, `:` reads a branch length, and any other
//! character starts a label run. Label runs stop only at a true delimiter
//! (`( ) , : ;`), so labels may contain literal spaces.
//!
//! Quoted labels and `[...]` comments are not supported.

use crate::errors::{ParseError, SourceContext};
use crate::tree::{NodeId, Tree};

/// Characters that terminate a label run.
const DELIMITERS: &[u8] = b"(),:;";

#[inline]
fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

/// Validate the structural well-formedness of a Newick string.
///
/// Detects, with a distinct error each: a missing terminating `;`, more
/// than one `;`, unbalanced parentheses, an empty group `()`, and
/// adjacent sibling groups `)(`.
pub fn check(text: &str, ctx: &SourceContext) -> Result<(), ParseError> {
    // Spans are reported against the full source, so offsets account for
    // leading whitespace stripped before validation.
    let offset = text.len() - text.trim_start().len();
    let trimmed = text.trim();

    if !trimmed.ends_with(';') {
        return Err(ParseError::MissingTerminator {
            src: ctx.named_source(),
            span: (offset + trimmed.len(), 0).into(),
        });
    }
    if trimmed.matches(';').count() > 1 {
        let first = trimmed.find(';').unwrap_or(0);
        let second = first + 1 + trimmed[first + 1..].find(';').unwrap_or(0);
        return Err(ParseError::ExtraTerminator {
            src: ctx.named_source(),
            span: (offset + second, 1).into(),
        });
    }
    let open = trimmed.matches('(').count();
    let close = trimmed.matches(')').count();
    if open != close {
        return Err(ParseError::UnbalancedParens {
            open,
            close,
            src: ctx.named_source(),
            span: (offset, trimmed.len()).into(),
        });
    }
    if let Some(pos) = trimmed.find("()") {
        return Err(ParseError::EmptyGroup {
            src: ctx.named_source(),
            span: (offset + pos, 2).into(),
        });
    }
    if let Some(pos) = trimmed.find(")(") {
        return Err(ParseError::AdjacentGroups {
            src: ctx.named_source(),
            span: (offset + pos, 2).into(),
        });
    }
    Ok(())
}

/// Parse a Newick string into a [`Tree`].
pub fn parse(text: &str) -> Result<Tree, ParseError> {
    parse_named("<newick>", text)
}

/// Parse a Newick string, reporting errors against a named source.
pub fn parse_named(name: &str, text: &str) -> Result<Tree, ParseError> {
    let ctx = SourceContext::new(name, text);
    check(text, &ctx)?;

    let bytes = text.as_bytes();
    let mut tree = Tree::new();
    let mut current = tree.root();

    // The first live character must be a '(', so start just past it.
    // A parenthesis-free string like "A;" scans from the beginning.
    let mut i = match text.find('(') {
        Some(pos) => pos + 1,
        None => 0,
    };

    while bytes[i] != b';' {
        match bytes[i] {
            b if (b as char).is_whitespace() => {}

            // descend into a new internal node
            b'(' => {
                current = tree.add_child(current, None);
            }

            // back up to the parent so a new sister can be added
            b',' => {
                current = ascend(&tree, current, &ctx, i, ',')?;
            }

            // back up to the parent, and possibly take its label
            b')' => {
                current = ascend(&tree, current, &ctx, i, ')')?;
                let end = label_end(bytes, i + 1);
                let run = text[i + 1..end].trim_start();
                if !run.is_empty() {
                    tree[current].label = Some(run.to_string());
                    i = end - 1;
                }
            }

            // branch length for the current node
            b':' => {
                let end = label_end(bytes, i + 1);
                let run = text[i + 1..end].trim();
                let length = run.parse::<f64>().map_err(|_| ParseError::InvalidBranchLength {
                    text: run.to_string(),
                    src: ctx.named_source(),
                    span: (i + 1, run.len()).into(),
                })?;
                tree[current].branch_length = Some(length);
                i = end - 1;
            }

            // start of a label: add that tip (or node) and descend into it
            _ => {
                let end = label_end(bytes, i);
                let label = text[i..end].to_string();
                current = tree.add_child(current, Some(label));
                i = end - 1;
            }
        }
        i += 1;
    }

    // When the string has surrounding (...), the synthetic root holds the
    // real root as its only child. Unwrap it.
    let root = tree.root();
    if tree[root].children.len() == 1 {
        let real = tree[root].children[0];
        tree.reroot(real);
    }
    let root = tree.root();
    if tree[root].branch_length.is_none() {
        tree[root].branch_length = Some(0.0);
    }

    Ok(tree)
}

fn ascend(
    tree: &Tree,
    current: NodeId,
    ctx: &SourceContext,
    pos: usize,
    found: char,
) -> Result<NodeId, ParseError> {
    tree[current].parent.ok_or_else(|| ParseError::UnexpectedToken {
        found,
        src: ctx.named_source(),
        span: (pos, 1).into(),
    })
}

/// Index just past the last character of the run starting at `start`.
fn label_end(bytes: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < bytes.len() && !is_delimiter(bytes[end]) {
        end += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(text: &str) -> SourceContext {
        SourceContext::new("<test>", text)
    }

    #[test]
    fn check_rejects_missing_terminator() {
        let err = check("(A,B)", &ctx("(A,B)")).unwrap_err();
        assert!(matches!(err, ParseError::MissingTerminator { .. }));
    }

    #[test]
    fn check_rejects_double_terminator() {
        let err = check("(A,B);;", &ctx("(A,B);;")).unwrap_err();
        assert!(matches!(err, ParseError::ExtraTerminator { .. }));
    }

    #[test]
    fn check_rejects_unbalanced_parens() {
        let err = check("(A,(B,C);", &ctx("(A,(B,C);")).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedParens { open: 2, close: 1, .. }));
    }

    #[test]
    fn check_rejects_adjacent_groups() {
        let err = check("(A,B)(C,D);", &ctx("(A,B)(C,D);")).unwrap_err();
        assert!(matches!(err, ParseError::AdjacentGroups { .. }));
    }

    #[test]
    fn check_rejects_empty_group() {
        let err = check("(A,());", &ctx("(A,());")).unwrap_err();
        assert!(matches!(err, ParseError::EmptyGroup { .. }));
    }

    #[test]
    fn check_accepts_valid_string() {
        assert!(check("((A:1,B:2):0.5,C:3);", &ctx("((A:1,B:2):0.5,C:3);")).is_ok());
    }

    #[test]
    fn parse_two_tips_with_lengths() {
        let tree = parse("(A:1,B:2);").unwrap();
        let root = tree.root();
        assert_eq!(tree[root].children.len(), 2);
        assert_eq!(tree[root].branch_length, Some(0.0));

        let a = tree[root].children[0];
        let b = tree[root].children[1];
        assert_eq!(tree[a].label.as_deref(), Some("A"));
        assert_eq!(tree[a].branch_length, Some(1.0));
        assert_eq!(tree[b].label.as_deref(), Some("B"));
        assert_eq!(tree[b].branch_length, Some(2.0));
    }

    #[test]
    fn parse_internal_label_after_paren() {
        let tree = parse("((A,B)ab,C);").unwrap();
        let root = tree.root();
        let ab = tree[root].children[0];
        assert_eq!(tree[ab].label.as_deref(), Some("ab"));
        assert!(!tree[ab].is_tip());
    }

    #[test]
    fn parse_internal_label_separated_by_space() {
        // A space between ')' and the label still names the closed node,
        // rather than opening a sibling.
        let tree = parse("(A,B) ab;").unwrap();
        let root = tree.root();
        assert_eq!(tree[root].children.len(), 2);
        assert_eq!(tree[root].label.as_deref(), Some("ab"));

        // Whitespace alone before the terminator is not a label.
        let tree = parse("(A,B) ;").unwrap();
        assert!(tree[tree.root()].label.is_none());
    }

    #[test]
    fn parse_unwraps_wrapped_root() {
        // Fully wrapped string: the synthetic root gets one child.
        let tree = parse("((A:1,B:2):5);").unwrap();
        let root = tree.root();
        assert!(tree[root].parent.is_none());
        assert_eq!(tree[root].children.len(), 2);
        assert_eq!(tree[root].branch_length, Some(5.0));
    }

    #[test]
    fn parse_label_with_spaces() {
        let tree = parse("(White-fronted tern:1,B:2);").unwrap();
        let root = tree.root();
        let a = tree[root].children[0];
        assert_eq!(tree[a].label.as_deref(), Some("White-fronted tern"));
    }

    #[test]
    fn parse_skips_whitespace_between_tokens() {
        let tree = parse("( A:1 , B:2 ) ;").unwrap();
        let root = tree.root();
        assert_eq!(tree[root].children.len(), 2);
        // Leading space is skipped; the run keeps its trailing space.
        let a = tree[root].children[0];
        assert_eq!(tree[a].label.as_deref(), Some("A"));
        assert_eq!(tree[a].branch_length, Some(1.0));
    }

    #[test]
    fn parse_scientific_notation_length() {
        let tree = parse("(A:1.5e-2,B:2);").unwrap();
        let a = tree[tree.root()].children[0];
        assert_eq!(tree[a].branch_length, Some(0.015));
    }

    #[test]
    fn parse_rejects_bad_branch_length() {
        let err = parse("(A:abc,B:2);").unwrap_err();
        assert!(matches!(err, ParseError::InvalidBranchLength { .. }));
    }

    #[test]
    fn parse_multifurcation() {
        let tree = parse("(A,B,C,D);").unwrap();
        assert_eq!(tree[tree.root()].children.len(), 4);
    }
}
