//! The tree model: an arena of nodes owned by a `Tree`.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`] index.
//! The parent link is a plain index, not an owning edge, so teardown is a
//! single `Vec` drop with no cycle concerns. Child order is insertion
//! order and doubles as the left-to-right drawing order.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::log::warn;

/// Index of a node within its [`Tree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A reconstructed character state.
///
/// Tips carry a single discrete state; internal nodes carry a probability
/// vector over all states (one entry per state, summing to 1).
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Discrete state of an observed taxon, in `[0, nstates)`.
    Tip(usize),
    /// Reconstructed state probabilities of an ancestor.
    Probs(Vec<f64>),
}

/// One node (or tip) of a phylogenetic tree.
///
/// Layout coordinates are always present as fields but stay `None` until
/// the relevant layout pass has run.
#[derive(Debug, Clone, Default)]
pub struct TreeNode {
    /// Name of the node; optional, not required to be unique.
    pub label: Option<String>,
    /// Parent node; `None` for the root. Non-owning back-reference.
    pub parent: Option<NodeId>,
    /// Children in left-to-right drawing order; empty for a tip.
    pub children: Vec<NodeId>,
    /// Distance from this node to its parent.
    pub branch_length: Option<f64>,
    /// Absolute time coordinate, if assigned.
    pub time: Option<f64>,
    /// Character state, attached by the annotator.
    pub state: Option<State>,
    /// Horizontal tree coordinate (linear) or Cartesian x (polar).
    pub x: Option<f64>,
    /// Vertical tree coordinate (linear) or Cartesian y (polar).
    pub y: Option<f64>,
    /// Radius from the root, polar layout only.
    pub r: Option<f64>,
    /// Angle in radians, polar layout only.
    pub theta: Option<f64>,
}

impl TreeNode {
    /// A node is a tip iff it has no children.
    #[inline]
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// The label, or `""` for unlabeled nodes.
    pub fn label_str(&self) -> &str {
        self.label.as_deref().unwrap_or("")
    }
}

/// A rooted phylogenetic tree backed by a node arena.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl Index<NodeId> for Tree {
    type Output = TreeNode;

    fn index(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding a single unlabeled root node.
    pub fn new() -> Self {
        Tree {
            nodes: vec![TreeNode::default()],
            root: NodeId(0),
        }
    }

    /// The current root of the tree.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a new child under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, label: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            label,
            parent: Some(parent),
            ..TreeNode::default()
        });
        self[parent].children.push(id);
        id
    }

    /// Re-root the tree at `id`, severing its parent link.
    ///
    /// Used by the parser to unwrap a synthetic root that ended up with a
    /// single child. The old root's arena slot becomes unreachable; all
    /// traversals start at [`Tree::root`], so it is inert.
    pub(crate) fn reroot(&mut self, id: NodeId) {
        self[id].parent = None;
        self.root = id;
    }

    /// All nodes reachable from `id`, parents before children.
    pub fn preorder(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            order.push(n);
            // Reversed push keeps children in left-to-right order.
            for &c in self[n].children.iter().rev() {
                stack.push(c);
            }
        }
        order
    }

    /// Tips in left-to-right drawing order.
    pub fn tips(&self) -> Vec<NodeId> {
        self.preorder(self.root)
            .into_iter()
            .filter(|&id| self[id].is_tip())
            .collect()
    }

    /// Labels and states of all tips, left-to-right.
    pub fn tip_states(&self) -> Vec<(Option<String>, Option<State>)> {
        self.tips()
            .into_iter()
            .map(|id| (self[id].label.clone(), self[id].state.clone()))
            .collect()
    }

    /// Count the tips below the root.
    ///
    /// Internal nodes with a child count other than 2 are reported as a
    /// diagnostic; the tree need not be strictly bifurcating.
    pub fn count_tips(&self) -> usize {
        self.count_tips_from(self.root)
    }

    fn count_tips_from(&self, id: NodeId) -> usize {
        let node = &self[id];
        if node.is_tip() {
            return 1;
        }
        if node.children.len() != 2 {
            warn!(
                "tree is not strictly bifurcating at '{}' ({} children)",
                node.label_str(),
                node.children.len()
            );
        }
        node.children.iter().map(|&c| self.count_tips_from(c)).sum()
    }

    /// Serialize the tree back to a Newick string.
    ///
    /// Inverse of parsing: topology and branch lengths round-trip. Labels
    /// containing delimiter characters are written verbatim, not
    /// re-escaped, and will not survive a round trip.
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(self.root, &mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, id: NodeId, out: &mut String) {
        let node = &self[id];
        if node.is_tip() {
            out.push_str(node.label_str());
        } else {
            out.push('(');
            for (i, &c) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.write_newick(c, out);
            }
            out.push(')');
            out.push_str(node.label_str());
        }
        if let Some(len) = node.branch_length {
            out.push(':');
            out.push_str(&len.to_string());
        }
    }

    /// Give sequential labels (`n1`, `n2`, ...) to unlabeled internal
    /// nodes, in post-order. The counter is threaded through the walk.
    pub fn label_nodes(&mut self) {
        let mut next = 1u32;
        self.label_nodes_from(self.root, &mut next);
    }

    fn label_nodes_from(&mut self, id: NodeId, next: &mut u32) {
        for c in self[id].children.clone() {
            self.label_nodes_from(c, next);
        }
        let node = &mut self[id];
        if !node.is_tip() && node.label.is_none() {
            node.label = Some(format!("n{next}"));
            *next += 1;
        }
    }

    /// Propagate absolute node times down from the root:
    /// `time = parent.time + branch_length`.
    ///
    /// This is the inverse of deriving branch lengths from known times.
    pub fn assign_node_times(&mut self, root_time: f64) {
        let root = self.root;
        self[root].time = Some(root_time);
        for id in self.preorder(self.root) {
            if let Some(parent) = self[id].parent {
                let t = self[parent].time.unwrap_or(root_time) + self[id].branch_length.unwrap_or(0.0);
                self[id].time = Some(t);
            }
        }
    }

    /// Signed time-depth from `id` to its leftmost or rightmost descendant
    /// tip, whichever has the larger magnitude. Descendant tips give
    /// negative ages (node time minus tip time).
    ///
    /// This assumes the extremal depth occurs at an extremal (leftmost or
    /// rightmost) leaf, which does not hold for every tree shape.
    pub fn age(&self, id: NodeId) -> f64 {
        let left = -self.path_depth(id, false);
        let right = -self.path_depth(id, true);
        if left.abs() > right.abs() { left } else { right }
    }

    /// Sum of branch lengths along the leftmost (`rightmost = false`) or
    /// rightmost path from `id` down to a tip.
    fn path_depth(&self, id: NodeId, rightmost: bool) -> f64 {
        let mut depth = 0.0;
        let mut cursor = id;
        loop {
            let node = &self[cursor];
            let next = if rightmost {
                node.children.last()
            } else {
                node.children.first()
            };
            match next {
                Some(&c) => {
                    depth += self[c].branch_length.unwrap_or(0.0);
                    cursor = c;
                }
                None => return depth,
            }
        }
    }

    fn fmt_node(&self, id: NodeId, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self[id];
        write!(f, "{:indent$}{}:", "", node.label_str())?;
        if let Some(t) = node.time {
            write!(f, " t = {t:.4},")?;
        }
        if let Some(l) = node.branch_length {
            write!(f, " l = {l:.4},")?;
        }
        match &node.state {
            Some(State::Tip(s)) => write!(f, " s = {s},")?,
            Some(State::Probs(p)) => {
                let probs: Vec<String> = p.iter().map(|v| format!("{v:.2}")).collect();
                write!(f, " s = [{}],", probs.join(" "))?;
            }
            None => {}
        }
        match node.parent {
            Some(p) => write!(f, " p = {}", self[p].label_str())?,
            None => write!(f, " p = --")?,
        }
        writeln!(f)?;
        for &c in &node.children {
            self.fmt_node(c, indent + 2, f)?;
        }
        Ok(())
    }
}

/// Indented listing of every node, for debugging.
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, 0, f)
    }
}
