//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files
//! and carry defaults so a minimal (or empty) config is valid.

use serde::{Deserialize, Serialize};

use crate::routing::tree::RouteSpec;

/// Root configuration for the navigation engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Loader/action deadlines.
    pub timeouts: TimeoutConfig,

    /// Form submission behavior.
    pub submission: SubmissionConfig,

    /// Cache revalidation behavior.
    pub revalidation: RevalidationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Timeout configuration for collaborator callbacks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single loader invocation in seconds.
    pub loader_secs: u64,

    /// Deadline for a single action invocation in seconds.
    pub action_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            loader_secs: 30,
            action_secs: 30,
        }
    }
}

/// What happens when a submission arrives while one is pending.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionPolicy {
    /// The new submission cancels the pending one (default).
    #[default]
    Supersede,
    /// The new submission is rejected with an explicit error.
    Reject,
}

/// Form submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Concurrent submission policy.
    pub policy: SubmissionPolicy,
}

/// Cache revalidation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RevalidationConfig {
    /// When true, every navigation re-runs loaders even on fresh cache
    /// entries.
    pub always_revalidate: bool,
}

impl Default for RevalidationConfig {
    fn default() -> Self {
        Self {
            always_revalidate: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Declarative route table file (CLI use; callbacks cannot be expressed
/// in TOML and are left unbound).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutesFile {
    pub routes: Vec<RouteEntry>,
}

/// One route in a route table file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteEntry {
    /// Path pattern; omitted for index and pathless routes.
    pub path: Option<String>,

    /// Marks an index route.
    pub index: bool,

    /// Nested child routes.
    pub children: Vec<RouteEntry>,
}

impl RouteEntry {
    /// Convert the entry (and its children) into a buildable spec.
    pub fn to_spec(&self) -> RouteSpec {
        let spec = match (&self.path, self.index) {
            (_, true) => RouteSpec::index(),
            (Some(path), false) => RouteSpec::path(path.clone()),
            (None, false) => RouteSpec::layout(),
        };
        spec.children(self.children.iter().map(RouteEntry::to_spec))
    }
}
