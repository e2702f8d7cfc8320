//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! navigate(path) / submit(form, path)
//!     → token.rs (new generation, cancel previous in-flight token)
//!     → routing (resolve match chain)
//!     → data (loaders concurrently / action alone, cache lookups)
//!     → controller.rs commit (generation check, snapshot swap, event)
//! ```
//!
//! # State Transitions
//! ```text
//! idle → loading → idle                 (navigation)
//! idle → submitting → loading → idle    (form submission)
//! ```
//!
//! # Design Decisions
//! - Last navigation wins: only the most recently initiated navigation
//!   may publish; superseded results are silently discarded
//! - Cancellation is cooperative and is not an error
//! - Loaders within one navigation are independent; one failure never
//!   cancels siblings
//! - All mutable state is owned by the controller; readers observe
//!   immutable snapshots

pub mod controller;
pub mod state;
pub mod token;

pub use controller::{Engine, NavigateError, NavigateOptions, SubmitError};
pub use state::{EngineEvent, EngineSnapshot, Location, NavigationPhase};
pub use token::NavToken;
