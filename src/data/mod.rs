//! Data loading subsystem.
//!
//! # Data Flow
//! ```text
//! Navigation resolves a match chain
//!     → loader.rs (invoke bound loaders/actions, boxed async callbacks)
//!     → cache.rs (store fresh results, serve cached ones)
//!
//! Successful action
//!     → cache.rs invalidate_all (every entry marked stale)
//!     → next loader pass re-fetches instead of serving cached data
//! ```
//!
//! # Design Decisions
//! - Loader/action payloads are opaque JSON values; the engine never
//!   inspects them
//! - Redirects are a sentinel outcome, not an error
//! - Cache is in-memory and session-scoped; nothing survives a reload

pub mod cache;
pub mod loader;

pub use cache::{CacheLookup, DataCache};
pub use loader::{
    ActionContext, ActionFn, DataError, DataOutcome, ErrorHandlerFn, LoaderContext, LoaderFn,
};
