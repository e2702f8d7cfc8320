//! Loader and action callback types.
//!
//! # Responsibilities
//! - Define the async callback shapes routes bind to (loader, action,
//!   error handler)
//! - Carry per-invocation context (path, params, form payload)
//! - Distinguish data results from redirect sentinels
//!
//! # Design Decisions
//! - Callbacks are `Arc<dyn Fn>` returning boxed futures so trees stay
//!   cloneable and `Send`
//! - Failures are plain values (`DataError`), cloneable so they can be
//!   handed to an error handler and recorded in the snapshot
//! - Timeouts are a distinct error kind, enforced by the controller

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;

use crate::routing::params::RouteParams;

/// Error raised by loader or action collaborator code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    /// A loader rejected.
    #[error("loader failed: {0}")]
    Loader(String),

    /// An action rejected.
    #[error("action failed: {0}")]
    Action(String),

    /// The invocation exceeded its configured deadline.
    #[error("{kind} timed out after {secs} seconds")]
    Timeout { kind: &'static str, secs: u64 },
}

/// Successful outcome of a loader or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOutcome {
    /// Opaque payload to publish under the producing route node.
    Data(Value),
    /// Sentinel: abandon the current pass and navigate to this path.
    Redirect(String),
}

/// Context handed to each loader invocation.
#[derive(Debug, Clone)]
pub struct LoaderContext {
    /// Normalized path being navigated to.
    pub path: String,
    /// Query string of the target location, if any.
    pub query: Option<String>,
    /// Parameters extracted by the matcher.
    pub params: RouteParams,
}

/// Context handed to an action invocation.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// Normalized path the submission targets.
    pub path: String,
    /// Parameters extracted by the matcher.
    pub params: RouteParams,
    /// Opaque form payload; serialization is the caller's concern.
    pub form: Value,
}

/// A read operation bound to a route node.
pub type LoaderFn =
    Arc<dyn Fn(LoaderContext) -> BoxFuture<'static, Result<DataOutcome, DataError>> + Send + Sync>;

/// A write/mutation operation bound to a route node.
pub type ActionFn =
    Arc<dyn Fn(ActionContext) -> BoxFuture<'static, Result<DataOutcome, DataError>> + Send + Sync>;

/// Maps a failure to the opaque payload the renderer shows for it.
pub type ErrorHandlerFn = Arc<dyn Fn(&DataError) -> Value + Send + Sync>;

/// Wrap an async closure as a [`LoaderFn`].
pub fn loader_fn<F, Fut>(f: F) -> LoaderFn
where
    F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DataOutcome, DataError>> + Send + 'static,
{
    Arc::new(move |cx| f(cx).boxed())
}

/// Wrap an async closure as an [`ActionFn`].
pub fn action_fn<F, Fut>(f: F) -> ActionFn
where
    F: Fn(ActionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<DataOutcome, DataError>> + Send + 'static,
{
    Arc::new(move |cx| f(cx).boxed())
}

/// Wrap a closure as an [`ErrorHandlerFn`].
pub fn error_handler_fn<F>(f: F) -> ErrorHandlerFn
where
    F: Fn(&DataError) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}
