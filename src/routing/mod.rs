//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! RouteSpec[] (declarative, nested)
//!     → tree.rs (validate & compile)
//!     → RouteTree (immutable arena of RouteNodes)
//!
//! Request path ("/contacts/42")
//!     → matcher.rs (recursive descent over segments)
//!     → Return: MatchResult (root-to-leaf chain + params) or NoMatch
//! ```
//!
//! # Design Decisions
//! - Trees compiled once, immutable at runtime
//! - Explicit NoMatch value rather than an error
//! - Literal segments outrank dynamic segments at equal depth
//! - Deterministic: same tree and path always produce the same match

pub mod matcher;
pub mod params;
pub mod segment;
pub mod tree;

pub use matcher::{MatchOutcome, MatchResult, RouteMatch};
pub use params::RouteParams;
pub use tree::{ConfigurationError, NodeId, RouteSpec, RouteTree};
