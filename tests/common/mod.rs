//! Shared fixtures for engine integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use waypoint::data::loader::{
    action_fn, error_handler_fn, loader_fn, ActionFn, DataError, DataOutcome, ErrorHandlerFn,
    LoaderFn,
};

/// A loader returning a fixed payload and counting its invocations.
pub fn counting_loader(payload: Value) -> (LoaderFn, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let loader = loader_fn(move |_cx| {
        let counter = counter.clone();
        let payload = payload.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DataOutcome::Data(payload))
        }
    });
    (loader, calls)
}

/// A loader that sleeps before resolving, for supersession tests.
pub fn slow_loader(delay: Duration, payload: Value) -> (LoaderFn, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let loader = loader_fn(move |_cx| {
        let counter = counter.clone();
        let payload = payload.clone();
        async move {
            tokio::time::sleep(delay).await;
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(DataOutcome::Data(payload))
        }
    });
    (loader, calls)
}

/// A loader that always fails.
pub fn failing_loader(message: &'static str) -> LoaderFn {
    loader_fn(move |_cx| async move { Err(DataError::Loader(message.to_string())) })
}

/// An action recording its form payloads.
#[allow(dead_code)]
pub fn recording_action(outcome: Result<DataOutcome, DataError>) -> (ActionFn, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let action = action_fn(move |_cx| {
        let counter = counter.clone();
        let outcome = outcome.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            outcome
        }
    });
    (action, calls)
}

/// An error handler that wraps the failure message as JSON.
pub fn json_error_handler() -> ErrorHandlerFn {
    error_handler_fn(|err| json!({ "error": err.to_string() }))
}
