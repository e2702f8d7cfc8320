//! Navigation state, locations, snapshots, and events.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::routing::matcher::RouteMatch;
use crate::routing::tree::NodeId;

/// Phase of the active navigation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationPhase {
    #[default]
    Idle,
    Loading,
    Submitting,
}

/// Error raised when a location string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid location '{0}'")]
pub struct LocationError(pub String);

/// A normalized target location: path plus optional query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Option<String>,
}

impl Location {
    /// Parse a raw location string ("/contacts/42?sort=asc").
    ///
    /// Fragment and history semantics belong to the host's URL layer;
    /// only path and query survive normalization.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let base = Url::parse("app://session/").map_err(|_| LocationError(raw.to_string()))?;
        let url = base.join(raw).map_err(|_| LocationError(raw.to_string()))?;
        Ok(Self {
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
        })
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.query {
            Some(q) => write!(f, "{}?{}", self.path, q),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Immutable view of committed engine state.
///
/// Readers always observe a complete snapshot; partial updates from a
/// superseded navigation are never published.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    /// Identifier of the navigation that produced this snapshot.
    pub navigation: Uuid,

    /// Phase of the in-flight navigation, if any.
    pub phase: NavigationPhase,

    /// Target of the in-flight navigation while loading/submitting.
    pub pending_location: Option<Location>,

    /// Last committed location.
    pub location: Option<Location>,

    /// Matched chain for the committed location, root to leaf.
    pub matches: Vec<RouteMatch>,

    /// Loader results keyed by the producing route node.
    pub data: HashMap<NodeId, Value>,

    /// Error payloads keyed by the node whose handler should render them.
    pub errors: HashMap<NodeId, Value>,

    /// Result of the most recent successful action, if any.
    pub action_data: Option<Value>,

    /// The committed location matched no route.
    pub not_found: bool,
}

/// Events published to subscribers on state changes.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The in-flight navigation changed phase.
    PhaseChanged(NavigationPhase),

    /// A navigation committed its results.
    Committed { navigation: Uuid, location: Location },

    /// A loader or action requested a redirect.
    Redirected { to: String },

    /// A failure had no error handler anywhere up the chain.
    UnhandledError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_path_and_query() {
        let loc = Location::parse("/contacts/42?sort=asc").unwrap();
        assert_eq!(loc.path, "/contacts/42");
        assert_eq!(loc.query.as_deref(), Some("sort=asc"));
        assert_eq!(loc.to_string(), "/contacts/42?sort=asc");
    }

    #[test]
    fn test_location_parse_relative() {
        let loc = Location::parse("contacts").unwrap();
        assert_eq!(loc.path, "/contacts");
        assert_eq!(loc.query, None);
    }

    #[test]
    fn test_location_drops_fragment() {
        let loc = Location::parse("/contacts#section").unwrap();
        assert_eq!(loc.path, "/contacts");
        assert_eq!(loc.query, None);
    }
}
