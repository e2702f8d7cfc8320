//! Navigation orchestration.
//!
//! # Responsibilities
//! - Run matched loaders concurrently and actions alone
//! - Enforce last-navigation-wins ordering on every publication
//! - Route failures to the nearest ancestor error handler
//! - Trigger full revalidation after successful actions
//!
//! # Design Decisions
//! - One commit lock guards the cancel-previous / publish pair, so a
//!   superseded navigation can never slip a result past its successor
//! - Snapshots are immutable and swapped whole (arc-swap); readers never
//!   see a partially updated state
//! - Cancellation is checked after awaiting, never surfaced as an error

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;
use uuid::Uuid;

use crate::config::schema::{EngineConfig, SubmissionPolicy};
use crate::data::cache::{CacheLookup, DataCache};
use crate::data::loader::{ActionContext, DataError, DataOutcome, LoaderContext};
use crate::navigation::state::{
    EngineEvent, EngineSnapshot, Location, LocationError, NavigationPhase,
};
use crate::navigation::token::NavToken;
use crate::observability::metrics;
use crate::routing::matcher::{MatchOutcome, MatchResult};
use crate::routing::tree::{NodeId, RouteTree};

const MAX_REDIRECTS: usize = 8;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Error starting a navigation.
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error(transparent)]
    InvalidLocation(#[from] LocationError),

    /// Loaders kept redirecting past the hop limit.
    #[error("too many redirects while navigating to '{0}'")]
    RedirectLoop(String),
}

/// Error starting a submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    InvalidLocation(#[from] LocationError),

    #[error("no route matched '{0}'")]
    NoMatch(String),

    #[error("no action declared along '{0}'")]
    NoAction(String),

    /// A submission is pending and the policy is `reject`.
    #[error("a submission is already in flight")]
    Busy,

    #[error(transparent)]
    Navigate(#[from] NavigateError),
}

/// Per-navigation options.
#[derive(Debug, Clone, Default)]
pub struct NavigateOptions {
    /// Re-run loaders even when the cache holds fresh entries.
    pub force_revalidate: bool,
}

/// Outcome of one concurrent loader pass.
enum LoaderPass {
    Completed {
        data: HashMap<NodeId, Value>,
        errors: HashMap<NodeId, Value>,
        unhandled: Vec<String>,
    },
    Redirect(String),
    Cancelled,
}

enum NodeResult {
    FromCache(Value),
    Loaded(Result<DataOutcome, DataError>),
}

/// The navigation engine: owns the route tree, the data cache, and all
/// mutable navigation state. Hosts observe it through snapshots and the
/// event stream.
pub struct Engine {
    tree: Arc<RouteTree>,
    config: EngineConfig,
    cache: DataCache,
    snapshot: ArcSwap<EngineSnapshot>,
    events: broadcast::Sender<EngineEvent>,
    /// Token of the navigation currently in flight, if any. The lock
    /// also serializes publication, which is what makes supersession
    /// race-free.
    flight: Mutex<Option<NavToken>>,
    generations: AtomicU64,
    submitting: AtomicBool,
}

impl Engine {
    /// Create an engine over a compiled route tree.
    pub fn new(tree: RouteTree, config: EngineConfig) -> Self {
        metrics::describe_metrics();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tree: Arc::new(tree),
            config,
            cache: DataCache::new(),
            snapshot: ArcSwap::from_pointee(EngineSnapshot::default()),
            events,
            flight: Mutex::new(None),
            generations: AtomicU64::new(0),
            submitting: AtomicBool::new(false),
        }
    }

    /// Create an engine with default configuration.
    pub fn with_defaults(tree: RouteTree) -> Self {
        Self::new(tree, EngineConfig::default())
    }

    /// The compiled route tree.
    pub fn route_tree(&self) -> &RouteTree {
        &self.tree
    }

    /// Current committed state.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot.load_full()
    }

    /// Subscribe to state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Navigate to a path, cancelling any in-flight navigation.
    pub async fn navigate(&self, path: &str, options: NavigateOptions) -> Result<(), NavigateError> {
        let location = Location::parse(path)?;
        let token = self.begin().await;
        self.navigate_inner(&token, location, &options, None).await
    }

    /// Programmatic redirect: publish the event and navigate.
    pub async fn redirect(&self, path: &str) -> Result<(), NavigateError> {
        let _ = self.events.send(EngineEvent::Redirected {
            to: path.to_string(),
        });
        self.navigate(path, NavigateOptions::default()).await
    }

    /// Submit a form payload to the deepest action matched by `target`.
    ///
    /// On success the whole cache is invalidated and every loader
    /// matched by the target runs again before the engine returns to
    /// idle.
    pub async fn submit(&self, form: Value, target: &str) -> Result<(), SubmitError> {
        let location = Location::parse(target)?;

        let _guard = match self.config.submission.policy {
            SubmissionPolicy::Reject => {
                if self
                    .submitting
                    .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    return Err(SubmitError::Busy);
                }
                Some(SubmitGuard(&self.submitting))
            }
            SubmissionPolicy::Supersede => None,
        };

        let token = self.begin().await;
        tracing::info!(path = %location, generation = token.generation(), "submission started");

        if !self
            .publish_phase(&token, NavigationPhase::Submitting, Some(location.clone()))
            .await
        {
            return Ok(());
        }

        let result = match self.tree.resolve(&location.path) {
            MatchOutcome::NoMatch => {
                self.publish_phase(&token, NavigationPhase::Idle, None).await;
                return Err(SubmitError::NoMatch(location.path.clone()));
            }
            MatchOutcome::Matched(m) => m,
        };

        let Some((action_node, action)) = result
            .matches
            .iter()
            .rev()
            .find_map(|m| self.tree.node(m.node).action.clone().map(|a| (m.node, a)))
        else {
            self.publish_phase(&token, NavigationPhase::Idle, None).await;
            return Err(SubmitError::NoAction(location.path.clone()));
        };

        let secs = self.config.timeouts.action_secs;
        let cx = ActionContext {
            path: location.path.clone(),
            params: result.params.clone(),
            form,
        };
        let outcome = match timeout(Duration::from_secs(secs), action(cx)).await {
            Ok(res) => res,
            Err(_) => Err(DataError::Timeout {
                kind: "action",
                secs,
            }),
        };

        if token.is_cancelled() {
            // Superseded while the action ran; its result is discarded.
            return Ok(());
        }

        match outcome {
            Err(err) => {
                metrics::loader_failed();
                self.publish_action_failure(&token, action_node, err).await;
                Ok(())
            }
            Ok(DataOutcome::Redirect(to)) => {
                self.cache.invalidate_all(token.generation());
                let _ = self.events.send(EngineEvent::Redirected { to: to.clone() });
                let target = Location::parse(&to)?;
                self.navigate_inner(
                    &token,
                    target,
                    &NavigateOptions {
                        force_revalidate: true,
                    },
                    None,
                )
                .await
                .map_err(SubmitError::from)
            }
            Ok(DataOutcome::Data(value)) => {
                self.cache.invalidate_all(token.generation());
                self.navigate_inner(
                    &token,
                    location,
                    &NavigateOptions {
                        force_revalidate: true,
                    },
                    Some(value),
                )
                .await
                .map_err(SubmitError::from)
            }
        }
    }

    /// Allocate a fresh token, superseding any navigation in flight.
    async fn begin(&self) -> NavToken {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let token = NavToken::new(generation);
        metrics::navigation_started();
        let mut flight = self.flight.lock().await;
        if let Some(prev) = flight.replace(token.clone()) {
            prev.cancel();
            metrics::navigation_cancelled();
            tracing::debug!(
                superseded = prev.generation(),
                by = generation,
                "navigation superseded"
            );
        }
        token
    }

    /// Core navigation loop, shared by navigate, redirect follow-ups,
    /// and post-action revalidation.
    async fn navigate_inner(
        &self,
        token: &NavToken,
        mut location: Location,
        options: &NavigateOptions,
        mut action_data: Option<Value>,
    ) -> Result<(), NavigateError> {
        let mut hops = 0;
        loop {
            let navigation = Uuid::new_v4();
            tracing::info!(
                path = %location,
                generation = token.generation(),
                "navigation started"
            );

            if !self
                .publish_phase(token, NavigationPhase::Loading, Some(location.clone()))
                .await
            {
                return Ok(());
            }

            let result = match self.tree.resolve(&location.path) {
                MatchOutcome::NoMatch => {
                    tracing::debug!(path = %location.path, "no route matched");
                    let snap = EngineSnapshot {
                        navigation,
                        phase: NavigationPhase::Idle,
                        pending_location: None,
                        location: Some(location.clone()),
                        matches: Vec::new(),
                        data: HashMap::new(),
                        errors: HashMap::new(),
                        action_data: None,
                        not_found: true,
                    };
                    self.publish(
                        token,
                        snap,
                        vec![
                            EngineEvent::PhaseChanged(NavigationPhase::Idle),
                            EngineEvent::Committed {
                                navigation,
                                location: location.clone(),
                            },
                        ],
                    )
                    .await;
                    return Ok(());
                }
                MatchOutcome::Matched(m) => m,
            };

            let force =
                options.force_revalidate || self.config.revalidation.always_revalidate;
            match self.run_loaders(token, &result, &location, force).await {
                LoaderPass::Cancelled => return Ok(()),
                LoaderPass::Redirect(to) => {
                    hops += 1;
                    if hops > MAX_REDIRECTS {
                        tracing::warn!(to = %to, "redirect limit reached");
                        let _ = self.events.send(EngineEvent::UnhandledError {
                            message: format!("redirect loop detected at '{to}'"),
                        });
                        return Err(NavigateError::RedirectLoop(to));
                    }
                    let _ = self.events.send(EngineEvent::Redirected { to: to.clone() });
                    location = Location::parse(&to)?;
                    action_data = None;
                }
                LoaderPass::Completed {
                    data,
                    errors,
                    unhandled,
                } => {
                    let snap = EngineSnapshot {
                        navigation,
                        phase: NavigationPhase::Idle,
                        pending_location: None,
                        location: Some(location.clone()),
                        matches: result.matches.clone(),
                        data,
                        errors,
                        action_data: action_data.take(),
                        not_found: false,
                    };
                    let committed = self
                        .publish(
                            token,
                            snap,
                            vec![
                                EngineEvent::PhaseChanged(NavigationPhase::Idle),
                                EngineEvent::Committed {
                                    navigation,
                                    location: location.clone(),
                                },
                            ],
                        )
                        .await;
                    if committed {
                        for message in unhandled {
                            let _ = self.events.send(EngineEvent::UnhandledError { message });
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Run every matched loader concurrently. Fresh cache entries
    /// short-circuit their loader unless `force` is set.
    async fn run_loaders(
        &self,
        token: &NavToken,
        result: &MatchResult,
        location: &Location,
        force: bool,
    ) -> LoaderPass {
        let mut futures: Vec<BoxFuture<'static, (NodeId, NodeResult)>> = Vec::new();

        for m in &result.matches {
            let node = self.tree.node(m.node);
            let Some(loader) = node.loader.clone() else {
                continue;
            };
            let id = m.node;

            if !force {
                if let CacheLookup::Fresh(value) = self.cache.lookup(id, &result.params) {
                    tracing::debug!(node = ?id, "serving cached loader result");
                    futures.push(async move { (id, NodeResult::FromCache(value)) }.boxed());
                    continue;
                }
            }

            let cx = LoaderContext {
                path: location.path.clone(),
                query: location.query.clone(),
                params: result.params.clone(),
            };
            let secs = self.config.timeouts.loader_secs;
            futures.push(
                async move {
                    let started = Instant::now();
                    let outcome = match timeout(Duration::from_secs(secs), loader(cx)).await {
                        Ok(res) => res,
                        Err(_) => Err(DataError::Timeout {
                            kind: "loader",
                            secs,
                        }),
                    };
                    metrics::loader_duration(started.elapsed().as_secs_f64());
                    (id, NodeResult::Loaded(outcome))
                }
                .boxed(),
            );
        }

        let results = join_all(futures).await;

        if token.is_cancelled() {
            tracing::debug!(
                generation = token.generation(),
                "superseded; loader results discarded"
            );
            return LoaderPass::Cancelled;
        }

        let mut data = HashMap::new();
        let mut errors = HashMap::new();
        let mut unhandled = Vec::new();
        let mut redirect = None;

        for (id, res) in results {
            match res {
                NodeResult::FromCache(value) => {
                    data.insert(id, value);
                }
                NodeResult::Loaded(Ok(DataOutcome::Data(value))) => {
                    self.cache
                        .store(id, &result.params, value.clone(), token.generation());
                    data.insert(id, value);
                }
                NodeResult::Loaded(Ok(DataOutcome::Redirect(to))) => {
                    // First redirect in chain order wins.
                    if redirect.is_none() {
                        redirect = Some(to);
                    }
                }
                NodeResult::Loaded(Err(err)) => {
                    metrics::loader_failed();
                    self.route_error(id, &err, &mut errors, &mut unhandled);
                }
            }
        }

        match redirect {
            Some(to) => LoaderPass::Redirect(to),
            None => LoaderPass::Completed {
                data,
                errors,
                unhandled,
            },
        }
    }

    /// Walk ancestors from the failing node to the nearest declared
    /// error handler; with none up to the root, record it as unhandled.
    fn route_error(
        &self,
        origin: NodeId,
        err: &DataError,
        errors: &mut HashMap<NodeId, Value>,
        unhandled: &mut Vec<String>,
    ) {
        let mut cursor = Some(origin);
        while let Some(id) = cursor {
            let node = self.tree.node(id);
            if let Some(handler) = &node.error_handler {
                tracing::debug!(
                    origin = ?origin,
                    handler = %node.full_path(),
                    error = %err,
                    "failure routed to error handler"
                );
                errors.insert(id, handler(err));
                return;
            }
            cursor = node.parent();
        }
        tracing::warn!(origin = ?origin, error = %err, "no error handler up the chain");
        unhandled.push(err.to_string());
    }

    /// Publish an action failure: previous committed data is kept, the
    /// handler payload replaces the error set, nothing partial leaks.
    async fn publish_action_failure(&self, token: &NavToken, origin: NodeId, err: DataError) {
        let mut errors = HashMap::new();
        let mut unhandled = Vec::new();
        self.route_error(origin, &err, &mut errors, &mut unhandled);

        let prev = self.snapshot.load_full();
        let snap = EngineSnapshot {
            navigation: Uuid::new_v4(),
            phase: NavigationPhase::Idle,
            pending_location: None,
            location: prev.location.clone(),
            matches: prev.matches.clone(),
            data: prev.data.clone(),
            errors,
            action_data: None,
            not_found: prev.not_found,
        };
        let committed = self
            .publish(
                token,
                snap,
                vec![EngineEvent::PhaseChanged(NavigationPhase::Idle)],
            )
            .await;
        if committed {
            for message in unhandled {
                let _ = self.events.send(EngineEvent::UnhandledError { message });
            }
        }
    }

    /// Swap in a snapshot if this token still belongs to the latest
    /// navigation. Returns false when the results must be discarded.
    async fn publish(
        &self,
        token: &NavToken,
        snapshot: EngineSnapshot,
        events: Vec<EngineEvent>,
    ) -> bool {
        let final_commit = snapshot.phase == NavigationPhase::Idle;
        let mut flight = self.flight.lock().await;
        if token.is_cancelled() {
            return false;
        }
        self.snapshot.store(Arc::new(snapshot));
        for event in events {
            let _ = self.events.send(event);
        }
        if final_commit {
            *flight = None;
        }
        true
    }

    /// Publish a phase transition on top of the current snapshot.
    async fn publish_phase(
        &self,
        token: &NavToken,
        phase: NavigationPhase,
        pending: Option<Location>,
    ) -> bool {
        let mut snap = (*self.snapshot.load_full()).clone();
        snap.phase = phase;
        snap.pending_location = pending;
        self.publish(token, snap, vec![EngineEvent::PhaseChanged(phase)]).await
    }
}

struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
