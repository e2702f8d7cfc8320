//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!
//! route file (TOML, CLI use)
//!     → loader.rs (parse & deserialize)
//!     → RouteTree::build (structural validation)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the engine is constructed
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks and
//!   reports every violation, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_routes, ConfigError};
pub use schema::{EngineConfig, ObservabilityConfig, SubmissionPolicy, TimeoutConfig};
