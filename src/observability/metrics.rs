//! Engine metrics.
//!
//! # Metrics
//! - `waypoint_navigations_total` (counter): navigations started
//! - `waypoint_navigations_cancelled_total` (counter): superseded in flight
//! - `waypoint_loader_failures_total` (counter): loader/action rejections
//! - `waypoint_cache_invalidations_total` (counter): full invalidations
//! - `waypoint_loader_duration_seconds` (histogram): loader latency
//!
//! # Design Decisions
//! - `metrics` facade only; exposition (Prometheus or otherwise) is the
//!   host application's responsibility
//! - Low-overhead updates, no labels in the hot path

use ::metrics::{counter, describe_counter, describe_histogram, histogram};

pub const NAVIGATIONS_TOTAL: &str = "waypoint_navigations_total";
pub const NAVIGATIONS_CANCELLED_TOTAL: &str = "waypoint_navigations_cancelled_total";
pub const LOADER_FAILURES_TOTAL: &str = "waypoint_loader_failures_total";
pub const CACHE_INVALIDATIONS_TOTAL: &str = "waypoint_cache_invalidations_total";
pub const LOADER_DURATION_SECONDS: &str = "waypoint_loader_duration_seconds";

/// Register metric descriptions with the installed recorder, if any.
pub fn describe_metrics() {
    describe_counter!(NAVIGATIONS_TOTAL, "Navigations started");
    describe_counter!(
        NAVIGATIONS_CANCELLED_TOTAL,
        "Navigations superseded while in flight"
    );
    describe_counter!(LOADER_FAILURES_TOTAL, "Loader and action failures");
    describe_counter!(CACHE_INVALIDATIONS_TOTAL, "Full cache invalidations");
    describe_histogram!(LOADER_DURATION_SECONDS, "Loader invocation latency");
}

pub fn navigation_started() {
    counter!(NAVIGATIONS_TOTAL).increment(1);
}

pub fn navigation_cancelled() {
    counter!(NAVIGATIONS_CANCELLED_TOTAL).increment(1);
}

pub fn loader_failed() {
    counter!(LOADER_FAILURES_TOTAL).increment(1);
}

pub fn cache_invalidated() {
    counter!(CACHE_INVALIDATIONS_TOTAL).increment(1);
}

pub fn loader_duration(seconds: f64) {
    histogram!(LOADER_DURATION_SECONDS).record(seconds);
}
