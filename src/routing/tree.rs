//! Route tree construction and validation.
//!
//! # Responsibilities
//! - Compile declarative `RouteSpec`s into an immutable node arena
//! - Validate the tree (sibling index collisions, param collisions,
//!   unreachable absolute children)
//! - Serialize a node's pattern chain back into a concrete path
//!
//! # Design Decisions
//! - Arena storage: nodes are indexed by `NodeId`, parents and children
//!   hold ids rather than references
//! - Validation returns the first structural error; the tree is never
//!   partially usable
//! - All validation happens at build time; matching never fails on a
//!   malformed tree

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::data::loader::{ActionFn, ErrorHandlerFn, LoaderFn};
use crate::routing::params::RouteParams;
use crate::routing::segment::{parse_pattern, SegmentPattern};

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Errors detected while compiling a route tree. Fatal at build time.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Two siblings both declare the index flag.
    #[error("duplicate index route under '{parent}'")]
    DuplicateIndex { parent: String },

    /// A dynamic segment name repeats along one root-to-node path.
    #[error("parameter ':{name}' declared twice along '{path}'")]
    DuplicateParam { path: String, name: String },

    /// An absolute child path does not extend its parent's path.
    #[error("child path '{child}' is not reachable under parent '{parent}'")]
    UnreachableChild { parent: String, child: String },

    /// Index routes are leaves; children would never match.
    #[error("index route under '{parent}' declares children")]
    IndexWithChildren { parent: String },

    /// A path pattern with no segments.
    #[error("empty path pattern '{pattern}'")]
    EmptyPattern { pattern: String },

    /// A segment that parses to neither a literal nor a parameter.
    #[error("invalid segment '{segment}' in pattern '{pattern}'")]
    InvalidSegment { pattern: String, segment: String },
}

/// How a node participates in matching.
#[derive(Clone)]
pub enum PathPattern {
    /// Consumes one path segment per pattern entry.
    Segments(Vec<SegmentPattern>),
    /// Matches when the remaining path is empty at this level.
    Index,
    /// Pathless layout: matches without consuming a segment.
    Layout,
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPattern::Segments(segs) => {
                let joined: Vec<String> = segs.iter().map(SegmentPattern::as_pattern).collect();
                write!(f, "Segments({})", joined.join("/"))
            }
            PathPattern::Index => write!(f, "Index"),
            PathPattern::Layout => write!(f, "Layout"),
        }
    }
}

/// Declarative description of one route, built with a fluent API.
///
/// ```
/// use waypoint::routing::tree::RouteSpec;
///
/// let spec = RouteSpec::path("contacts").children([
///     RouteSpec::index(),
///     RouteSpec::path(":id"),
///     RouteSpec::path("new"),
/// ]);
/// # let _ = spec;
/// ```
pub struct RouteSpec {
    kind: SpecKind,
    loader: Option<LoaderFn>,
    action: Option<ActionFn>,
    error_handler: Option<ErrorHandlerFn>,
    children: Vec<RouteSpec>,
}

enum SpecKind {
    Path(String),
    Index,
    Layout,
}

impl RouteSpec {
    /// A route matching the given path pattern ("contacts", ":id",
    /// "contacts/:id", or an absolute "/contacts/:id").
    pub fn path(pattern: impl Into<String>) -> Self {
        Self::new(SpecKind::Path(pattern.into()))
    }

    /// An index route: matches when the remaining path is empty at its
    /// parent's level.
    pub fn index() -> Self {
        Self::new(SpecKind::Index)
    }

    /// A pathless layout route: participates in the match chain without
    /// consuming a segment.
    pub fn layout() -> Self {
        Self::new(SpecKind::Layout)
    }

    fn new(kind: SpecKind) -> Self {
        Self {
            kind,
            loader: None,
            action: None,
            error_handler: None,
            children: Vec::new(),
        }
    }

    /// Bind a loader to this route.
    pub fn loader(mut self, loader: LoaderFn) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Bind an action to this route.
    pub fn action(mut self, action: ActionFn) -> Self {
        self.action = Some(action);
        self
    }

    /// Bind an error handler to this route.
    pub fn error_handler(mut self, handler: ErrorHandlerFn) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Append one child route.
    pub fn child(mut self, child: RouteSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child routes.
    pub fn children(mut self, children: impl IntoIterator<Item = RouteSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// One compiled route node. Owned exclusively by its tree.
pub struct RouteNode {
    pub(crate) id: NodeId,
    pub(crate) pattern: PathPattern,
    pub(crate) loader: Option<LoaderFn>,
    pub(crate) action: Option<ActionFn>,
    pub(crate) error_handler: Option<ErrorHandlerFn>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Concatenated pattern path from the root, e.g. "/contacts/:id".
    pub(crate) full_path: String,
}

impl RouteNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("id", &self.id)
            .field("pattern", &self.pattern)
            .field("full_path", &self.full_path)
            .field("loader", &self.loader.is_some())
            .field("action", &self.action.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Immutable, validated route tree.
pub struct RouteTree {
    pub(crate) nodes: Vec<RouteNode>,
    pub(crate) roots: Vec<NodeId>,
}

impl RouteTree {
    /// Compile a list of top-level route specs into a tree.
    pub fn build(specs: Vec<RouteSpec>) -> Result<Self, ConfigurationError> {
        let mut tree = RouteTree {
            nodes: Vec::new(),
            roots: Vec::new(),
        };
        let roots = tree.insert_level(None, "", &HashSet::new(), specs)?;
        tree.roots = roots;
        Ok(tree)
    }

    /// Number of compiled nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id.0]
    }

    /// Pattern paths of every leaf node, in declaration order.
    pub fn leaf_paths(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.full_path.clone())
            .collect()
    }

    /// Serialize the root-to-node pattern chain into a concrete path,
    /// substituting dynamic segments from `params`. Returns `None` when a
    /// required parameter is missing.
    pub fn path_for(&self, id: NodeId, params: &RouteParams) -> Option<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(cur) = cursor {
            chain.push(cur);
            cursor = self.nodes[cur.0].parent;
        }
        chain.reverse();

        let mut parts: Vec<String> = Vec::new();
        for node_id in chain {
            if let PathPattern::Segments(segs) = &self.nodes[node_id.0].pattern {
                for seg in segs {
                    match seg {
                        SegmentPattern::Literal(s) => parts.push(s.clone()),
                        SegmentPattern::Param(name) => parts.push(params.get(name)?.to_string()),
                    }
                }
            }
        }
        Some(format!("/{}", parts.join("/")))
    }

    fn insert_level(
        &mut self,
        parent: Option<NodeId>,
        parent_path: &str,
        inherited_params: &HashSet<String>,
        specs: Vec<RouteSpec>,
    ) -> Result<Vec<NodeId>, ConfigurationError> {
        let mut ids = Vec::with_capacity(specs.len());
        let mut saw_index = false;

        for spec in specs {
            let (pattern, full_path) = match &spec.kind {
                SpecKind::Index => {
                    if saw_index {
                        return Err(ConfigurationError::DuplicateIndex {
                            parent: level_name(parent_path),
                        });
                    }
                    saw_index = true;
                    if !spec.children.is_empty() {
                        return Err(ConfigurationError::IndexWithChildren {
                            parent: level_name(parent_path),
                        });
                    }
                    (PathPattern::Index, level_name(parent_path))
                }
                SpecKind::Layout => (PathPattern::Layout, level_name(parent_path)),
                SpecKind::Path(raw) => {
                    let relative = relative_pattern(parent_path, raw)?;
                    let segments = parse_pattern(&relative)?;
                    let joined: Vec<String> =
                        segments.iter().map(SegmentPattern::as_pattern).collect();
                    let full = format!(
                        "{}/{}",
                        parent_path.trim_end_matches('/'),
                        joined.join("/")
                    );
                    (PathPattern::Segments(segments), full)
                }
            };

            let mut branch_params = inherited_params.clone();
            if let PathPattern::Segments(segs) = &pattern {
                for seg in segs {
                    if let SegmentPattern::Param(name) = seg {
                        if !branch_params.insert(name.clone()) {
                            return Err(ConfigurationError::DuplicateParam {
                                path: full_path.clone(),
                                name: name.clone(),
                            });
                        }
                    }
                }
            }

            let id = NodeId(self.nodes.len());
            self.nodes.push(RouteNode {
                id,
                pattern,
                loader: spec.loader,
                action: spec.action,
                error_handler: spec.error_handler,
                parent,
                children: Vec::new(),
                full_path,
            });

            let child_path = self.nodes[id.0].full_path.clone();
            let children =
                self.insert_level(Some(id), &child_path, &branch_params, spec.children)?;
            self.nodes[id.0].children = children;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl fmt::Debug for RouteTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTree")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots)
            .finish()
    }
}

/// Display name for a level when reporting errors ("/" for the root).
fn level_name(parent_path: &str) -> String {
    if parent_path.is_empty() {
        "/".to_string()
    } else {
        parent_path.to_string()
    }
}

/// Resolve a raw pattern relative to its parent. Absolute patterns must
/// extend the parent's full path.
fn relative_pattern(parent_path: &str, raw: &str) -> Result<String, ConfigurationError> {
    if !raw.starts_with('/') {
        return Ok(raw.to_string());
    }
    if parent_path.is_empty() || parent_path == "/" {
        return Ok(raw.to_string());
    }
    match raw.strip_prefix(parent_path) {
        Some(rest) if rest.starts_with('/') || rest.is_empty() => Ok(rest.to_string()),
        _ => Err(ConfigurationError::UnreachableChild {
            parent: parent_path.to_string(),
            child: raw.to_string(),
        }),
    }
}
