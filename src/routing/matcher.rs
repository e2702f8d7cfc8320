//! Path matching against a compiled route tree.
//!
//! # Responsibilities
//! - Descend the tree comparing path segments
//! - Bind dynamic segments into the parameter map
//! - Rank candidates: index, then literal, then dynamic, then pathless
//!
//! # Design Decisions
//! - Depth-first search returns the first complete match; child order
//!   within a kind follows declaration order
//! - Literal segments always outrank dynamic segments at equal depth
//! - `NoMatch` is a value, not an error; the caller decides what to
//!   render for it

use crate::routing::params::RouteParams;
use crate::routing::segment::{split_path, SegmentPattern};
use crate::routing::tree::{NodeId, PathPattern, RouteTree};

/// Result of matching a request path against a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(MatchResult),
    NoMatch,
}

/// Root-to-leaf chain of matched nodes plus extracted parameters.
///
/// Rebuilt on every navigation; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matches: Vec<RouteMatch>,
    pub params: RouteParams,
}

/// One entry in the matched chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub node: NodeId,
    /// Pattern path of the node, e.g. "/contacts/:id".
    pub path: String,
}

impl RouteTree {
    /// Find the best-matching leaf-to-root chain for a request path.
    pub fn resolve(&self, path: &str) -> MatchOutcome {
        let segments = split_path(path);
        for &root in &self.rank_children(&self.roots) {
            if let Some((chain, params)) = self.descend(root, &segments, 0, RouteParams::new()) {
                let matches = chain
                    .into_iter()
                    .map(|id| RouteMatch {
                        node: id,
                        path: self.node(id).full_path().to_string(),
                    })
                    .collect();
                return MatchOutcome::Matched(MatchResult { matches, params });
            }
        }
        MatchOutcome::NoMatch
    }

    fn descend(
        &self,
        id: NodeId,
        segments: &[&str],
        idx: usize,
        params: RouteParams,
    ) -> Option<(Vec<NodeId>, RouteParams)> {
        let node = self.node(id);
        match &node.pattern {
            PathPattern::Index => {
                (idx == segments.len()).then(|| (vec![id], params))
            }
            PathPattern::Layout => {
                if node.children.is_empty() {
                    return (idx == segments.len()).then(|| (vec![id], params));
                }
                self.descend_children(id, segments, idx, params)
            }
            PathPattern::Segments(pats) => {
                let next = idx + pats.len();
                if next > segments.len() {
                    return None;
                }
                let mut bound = params;
                for (pat, seg) in pats.iter().zip(&segments[idx..next]) {
                    match pat {
                        SegmentPattern::Literal(lit) => {
                            if lit != seg {
                                return None;
                            }
                        }
                        SegmentPattern::Param(name) => {
                            bound.insert(name.clone(), (*seg).to_string());
                        }
                    }
                }
                if node.children.is_empty() {
                    return (next == segments.len()).then(|| (vec![id], bound));
                }
                if let Some(found) = self.descend_children(id, segments, next, bound.clone()) {
                    return Some(found);
                }
                // No child consumed the remainder; the node itself matches
                // when the path ends here (layout without an index child).
                (next == segments.len()).then(|| (vec![id], bound))
            }
        }
    }

    fn descend_children(
        &self,
        id: NodeId,
        segments: &[&str],
        idx: usize,
        params: RouteParams,
    ) -> Option<(Vec<NodeId>, RouteParams)> {
        for &child in &self.rank_children(&self.node(id).children) {
            if let Some((mut chain, params)) = self.descend(child, segments, idx, params.clone()) {
                chain.insert(0, id);
                return Some((chain, params));
            }
        }
        None
    }

    /// Order candidates by specificity: index, literal-first patterns,
    /// dynamic-first patterns, then pathless layouts. Stable within a
    /// kind, so declaration order breaks ties.
    fn rank_children(&self, ids: &[NodeId]) -> Vec<NodeId> {
        let mut ranked: Vec<NodeId> = ids.to_vec();
        ranked.sort_by_key(|&id| match &self.node(id).pattern {
            PathPattern::Index => 0u8,
            PathPattern::Segments(segs) => match segs.first() {
                Some(SegmentPattern::Literal(_)) => 1,
                _ => 2,
            },
            PathPattern::Layout => 3,
        });
        ranked
    }
}
