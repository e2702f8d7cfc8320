//! Declarative client-side route matching and data loading engine.

pub mod config;
pub mod data;
pub mod navigation;
pub mod observability;
pub mod routing;

pub use config::schema::EngineConfig;
pub use data::loader::{DataError, DataOutcome, LoaderContext, ActionContext};
pub use navigation::controller::{Engine, NavigateOptions};
pub use navigation::state::{EngineEvent, EngineSnapshot, Location, NavigationPhase};
pub use routing::matcher::{MatchOutcome, MatchResult};
pub use routing::tree::{ConfigurationError, RouteSpec, RouteTree};
