//! Attach character states from a state table to a parsed tree.
//!
//! Tips take a single discrete state; internal nodes take a probability
//! vector over all states. The number of states is inferred from the
//! table itself: the longest value list wins.

use std::collections::HashMap;

use crate::errors::StateError;
use crate::log::{debug, warn};
use crate::tree::{State, Tree};

/// Absolute tolerance for probability vectors summing to 1.
pub const SUM_TOLERANCE: f64 = 0.01;

/// A mapping from node label to its state values, as read from a TTN file.
pub type StateTable = HashMap<String, Vec<f64>>;

/// Infer the number of states from the table: the maximum list length.
pub fn nstates(table: &StateTable) -> usize {
    table.values().map(Vec::len).max().unwrap_or(0)
}

/// Attach a state to every node whose label appears in `table`.
///
/// Nodes without a table entry are left unannotated; pruned or internal
/// nodes may legitimately lack states, so this is a diagnostic, not an
/// error. Returns the inferred number of states.
///
/// Fails with a [`StateError`] naming the offending label when a tip
/// entry is not a single in-range integer, or an internal entry is not a
/// full-length probability vector summing to 1 within [`SUM_TOLERANCE`].
pub fn annotate(tree: &mut Tree, table: &StateTable) -> Result<usize, StateError> {
    let nstates = nstates(table);

    for id in tree.preorder(tree.root()) {
        let Some(label) = tree[id].label.clone() else {
            continue;
        };
        let Some(values) = table.get(&label) else {
            warn!("no state found for '{}'", label);
            continue;
        };

        let state = if tree[id].is_tip() {
            if values.len() != 1 {
                return Err(StateError::TipValueCount {
                    label,
                    found: values.len(),
                });
            }
            let value = values[0];
            let state = value as i64;
            if state < 0 || state as usize >= nstates {
                return Err(StateError::TipStateRange {
                    label,
                    value,
                    nstates,
                });
            }
            State::Tip(state as usize)
        } else {
            if values.len() != nstates {
                return Err(StateError::VectorLength {
                    label,
                    found: values.len(),
                    expected: nstates,
                });
            }
            let sum: f64 = values.iter().sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE {
                return Err(StateError::BadSum { label, sum });
            }
            State::Probs(values.clone())
        };

        debug!("state attached to '{}'", tree[id].label_str());
        tree[id].state = Some(state);
    }

    Ok(nstates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick;

    fn table(entries: &[(&str, &[f64])]) -> StateTable {
        entries
            .iter()
            .map(|(label, values)| (label.to_string(), values.to_vec()))
            .collect()
    }

    #[test]
    fn annotates_tips_and_nodes() {
        let mut tree = newick::parse("((A:1,B:2)ab:1,C:3);").unwrap();
        let table = table(&[
            ("A", &[0.0][..]),
            ("B", &[1.0][..]),
            ("C", &[0.0][..]),
            ("ab", &[0.3, 0.7][..]),
        ]);
        let n = annotate(&mut tree, &table).unwrap();
        assert_eq!(n, 2);

        let tips = tree.tips();
        assert_eq!(tree[tips[0]].state, Some(State::Tip(0)));
        assert_eq!(tree[tips[1]].state, Some(State::Tip(1)));

        let ab = tree[tree.root()].children[0];
        assert_eq!(tree[ab].state, Some(State::Probs(vec![0.3, 0.7])));
    }

    #[test]
    fn unmatched_nodes_are_skipped() {
        let mut tree = newick::parse("(A:1,B:2);").unwrap();
        let table = table(&[("A", &[0.0][..]), ("elsewhere", &[1.0][..])]);
        annotate(&mut tree, &table).unwrap();
        let tips = tree.tips();
        assert_eq!(tree[tips[0]].state, Some(State::Tip(0)));
        assert_eq!(tree[tips[1]].state, None);
    }

    #[test]
    fn tip_with_two_values_fails() {
        let mut tree = newick::parse("(A:1,B:2);").unwrap();
        let table = table(&[("A", &[0.5, 0.5][..]), ("B", &[1.0][..])]);
        let err = annotate(&mut tree, &table).unwrap_err();
        assert!(matches!(err, StateError::TipValueCount { found: 2, .. }));
    }

    #[test]
    fn tip_state_out_of_range_fails() {
        let mut tree = newick::parse("(A:1,B:2);").unwrap();
        // nstates = 2 from the root vector; 5 is out of range.
        let table = table(&[("A", &[5.0][..]), ("B", &[1.0, 0.0][..])]);
        let err = annotate(&mut tree, &table).unwrap_err();
        assert!(matches!(err, StateError::TipStateRange { nstates: 2, .. }));
    }

    #[test]
    fn vector_sum_outside_tolerance_fails() {
        let mut tree = newick::parse("((A:1,B:2)ab:1,C:3);").unwrap();
        let table = table(&[("ab", &[0.51, 0.51][..])]);
        let err = annotate(&mut tree, &table).unwrap_err();
        match err {
            StateError::BadSum { sum, .. } => assert!((sum - 1.02).abs() < 1e-9),
            other => panic!("expected BadSum, got {other:?}"),
        }
    }

    #[test]
    fn vector_sum_inside_tolerance_passes() {
        let mut tree = newick::parse("((A:1,B:2)ab:1,C:3);").unwrap();
        let table = table(&[("ab", &[0.5, 0.495][..])]);
        annotate(&mut tree, &table).unwrap();
        let ab = tree[tree.root()].children[0];
        // Sum is 0.995: accepted, and not renormalized.
        assert_eq!(tree[ab].state, Some(State::Probs(vec![0.5, 0.495])));
    }

    #[test]
    fn wrong_vector_length_fails() {
        let mut tree = newick::parse("((A,B)ab,(C,D)cd);").unwrap();
        // nstates = 3 from "ab"; the 2-entry vector on "cd" is short.
        let table = table(&[("ab", &[0.2, 0.3, 0.5][..]), ("cd", &[0.5, 0.5][..])]);
        let err = annotate(&mut tree, &table).unwrap_err();
        assert!(matches!(
            err,
            StateError::VectorLength { found: 2, expected: 3, .. }
        ));
    }
}
