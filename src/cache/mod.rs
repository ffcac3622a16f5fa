//! Query Cache
//!
//! In-memory keyed cache mirroring server collections. Each key holds:
//! - the last confirmed value (from the server or an explicit `write`)
//! - a log of speculative edits applied on top of it
//! - staleness bookkeeping and the fetcher used to refresh it
//!
//! The visible value of a key is always `confirmed` with every pending edit
//! replayed in order. Rolling back an edit removes it from the log, so a
//! failed mutation never erases the effect of a concurrent one.
//!
//! Single-threaded: the client is an `Rc` handle and callers run on one
//! cooperative executor (the browser event loop, or a current-thread
//! runtime in tests).

mod clock;


use std::any::Any;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::error::{ApiError, ApiResult};
use crate::resource::LocalId;

pub use clock::{Clock, ManualClock, SystemClock};

type AnyValue = Rc<dyn Any>;
type FetchFuture = Pin<Box<dyn Future<Output = ApiResult<AnyValue>>>>;
type Fetcher = Rc<dyn Fn() -> FetchFuture>;
type Listener = Rc<dyn Fn(&QueryClient)>;
type Edit = Rc<dyn Fn(&AnyValue) -> Option<AnyValue>>;

/// Typed cache key. Paths are `/`-separated, e.g. `tareas/3`.
pub struct QueryKey<T> {
    path: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> QueryKey<T> {
    pub const fn new(path: &'static str) -> Self {
        Self {
            path: Cow::Borrowed(path),
            _marker: PhantomData,
        }
    }

    pub fn owned(path: String) -> Self {
        Self {
            path: Cow::Owned(path),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl<T> Clone for QueryKey<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for QueryKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryKey({})", self.path)
    }
}

/// `prefix` matches itself and anything below it on a `/` boundary
pub fn key_matches(path: &str, prefix: &str) -> bool {
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    /// How long a confirmed value is served without refetching
    pub stale_time: Duration,
}

impl QueryOptions {
    pub fn stale_after(stale_time: Duration) -> Self {
        Self { stale_time }
    }
}

/// What a reader sees for one key
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// Error of the most recent settled fetch, cleared by a successful one
    pub error: Option<ApiError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> QueryState<T> {
    fn empty() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            is_stale: true,
            updated_at: None,
        }
    }

    /// Nothing to show yet and nothing went wrong
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }
}

struct PendingEdit {
    id: u64,
    apply: Edit,
    /// Fetch generation current when the server accepted the edit
    succeeded_at: Option<u64>,
}

struct Entry {
    confirmed: Option<AnyValue>,
    value: Option<AnyValue>,
    pending: Vec<PendingEdit>,
    error: Option<ApiError>,
    updated_at: Option<DateTime<Utc>>,
    invalidated: bool,
    options: QueryOptions,
    fetcher: Option<Fetcher>,
    generation: u64,
    in_flight: Option<u64>,
    settled: Rc<Notify>,
    listeners: Vec<(u64, Listener)>,
}

impl Entry {
    fn new() -> Self {
        Self {
            confirmed: None,
            value: None,
            pending: Vec::new(),
            error: None,
            updated_at: None,
            invalidated: false,
            options: QueryOptions::default(),
            fetcher: None,
            generation: 0,
            in_flight: None,
            settled: Rc::new(Notify::new()),
            listeners: Vec::new(),
        }
    }

    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        if self.invalidated {
            return true;
        }
        match self.updated_at {
            None => true,
            Some(at) => now
                .signed_duration_since(at)
                .to_std()
                .map(|elapsed| elapsed >= self.options.stale_time)
                .unwrap_or(false),
        }
    }

    /// Replay pending edits over the confirmed value
    fn recompute(&mut self) {
        let mut value = self.confirmed.clone();
        for edit in &self.pending {
            if let Some(next) = value.as_ref().and_then(|current| (edit.apply)(current)) {
                value = Some(next);
            }
        }
        self.value = value;
    }

    fn state<T: Clone + 'static>(&self, now: DateTime<Utc>) -> QueryState<T> {
        QueryState {
            data: self
                .value
                .as_ref()
                .and_then(|v| v.downcast_ref::<T>())
                .cloned(),
            error: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
            is_stale: self.is_stale(now),
            updated_at: self.updated_at,
        }
    }

    /// Abandon the in-flight fetch; its response will be discarded
    fn supersede(&mut self) {
        self.generation += 1;
        self.in_flight = None;
    }
}

struct Inner {
    entries: HashMap<String, Entry>,
    clock: Rc<dyn Clock>,
    next_listener: u64,
    next_edit: u64,
    next_local_id: u64,
}

impl Inner {
    fn entry(&mut self, path: &str) -> &mut Entry {
        self.entries.entry(path.to_string()).or_insert_with(Entry::new)
    }

    fn matching(&self, prefix: &str) -> Vec<String> {
        self.entries
            .keys()
            .filter(|path| key_matches(path, prefix))
            .cloned()
            .collect()
    }
}

/// Snapshot held by a mutation until its request settles.
///
/// Dropping it without `confirm` or `rollback` (e.g. the mutation future
/// was abandoned) rolls the edit back.
#[must_use = "settle the context with confirm or rollback"]
pub struct MutationContext<T> {
    client: Weak<RefCell<Inner>>,
    path: String,
    edit_id: Option<u64>,
    snapshot: Option<T>,
}

impl<T> MutationContext<T> {
    /// Collection as it was right before the speculative edit
    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    /// False when the key had no value, so nothing was edited
    pub fn is_applied(&self) -> bool {
        self.edit_id.is_some()
    }
}

impl<T> Drop for MutationContext<T> {
    fn drop(&mut self) {
        let Some(edit_id) = self.edit_id.take() else {
            return;
        };
        let Some(inner) = self.client.upgrade() else {
            return;
        };
        let removed = match inner.try_borrow_mut() {
            Ok(mut inner) => match inner.entries.get_mut(&self.path) {
                Some(entry) => {
                    entry.pending.retain(|e| e.id != edit_id);
                    entry.recompute();
                    true
                }
                None => false,
            },
            Err(_) => false,
        };
        if removed {
            debug!(key = %self.path, "mutation abandoned, dropped its speculative edit");
            QueryClient { inner }.notify(&self.path);
        }
    }
}

/// Clears `in_flight` when a fetch future is dropped before it settles,
/// so later reads start a new request instead of waiting forever
struct InFlightGuard<'a> {
    client: &'a QueryClient,
    path: &'a str,
    generation: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let abandoned = match self.client.inner.try_borrow_mut() {
            Ok(mut inner) => match inner.entries.get_mut(self.path) {
                Some(entry) if entry.in_flight == Some(self.generation) => {
                    entry.in_flight = None;
                    entry.settled.notify_waiters();
                    true
                }
                _ => false,
            },
            Err(_) => false,
        };
        if abandoned {
            debug!(key = self.path, generation = self.generation, "fetch abandoned");
            self.client.notify(self.path);
        }
    }
}

/// Handle to one cache instance. Clones share state.
#[derive(Clone)]
pub struct QueryClient {
    inner: Rc<RefCell<Inner>>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                entries: HashMap::new(),
                clock,
                next_listener: 0,
                next_edit: 0,
                next_local_id: 0,
            })),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.inner.borrow().clock.now()
    }

    /// Associate a fetcher and staleness window with a key
    pub fn register<T, F, Fut>(&self, key: &QueryKey<T>, options: QueryOptions, fetch: F)
    where
        T: 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ApiResult<T>> + 'static,
    {
        let fetcher: Fetcher = Rc::new(move || {
            let fut = fetch();
            Box::pin(async move { fut.await.map(|value| Rc::new(value) as AnyValue) }) as FetchFuture
        });
        let mut inner = self.inner.borrow_mut();
        let entry = inner.entry(key.path());
        entry.options = options;
        entry.fetcher = Some(fetcher);
    }

    /// Current state without touching the network
    pub fn read<T: Clone + 'static>(&self, key: &QueryKey<T>) -> QueryState<T> {
        let inner = self.inner.borrow();
        let now = inner.clock.now();
        inner
            .entries
            .get(key.path())
            .map(|entry| entry.state(now))
            .unwrap_or_else(QueryState::empty)
    }

    /// Replace the confirmed value. Pending speculative edits stay on top.
    pub fn write<T: 'static>(&self, key: &QueryKey<T>, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            let now = inner.clock.now();
            let entry = inner.entry(key.path());
            entry.confirmed = Some(Rc::new(value));
            entry.error = None;
            entry.updated_at = Some(now);
            entry.invalidated = false;
            entry.recompute();
        }
        self.notify(key.path());
    }

    /// Cached value when fresh, otherwise fetch.
    ///
    /// Concurrent reads share the in-flight request.
    pub async fn fetch<T: Clone + 'static>(&self, key: &QueryKey<T>) -> ApiResult<T> {
        enum Lookup<T> {
            Fresh(T),
            InFlight,
            Stale,
        }

        let lookup = {
            let inner = self.inner.borrow();
            let now = inner.clock.now();
            match inner.entries.get(key.path()) {
                None => Lookup::Stale,
                Some(entry) if entry.in_flight.is_some() => Lookup::InFlight,
                Some(entry) => match entry.state::<T>(now) {
                    QueryState {
                        data: Some(data),
                        is_stale: false,
                        ..
                    } => Lookup::Fresh(data),
                    _ => Lookup::Stale,
                },
            }
        };

        match lookup {
            Lookup::Fresh(data) => {
                trace!(key = key.path(), "cache hit");
                Ok(data)
            }
            Lookup::InFlight => {
                self.wait_settled(key.path()).await?;
                self.current(key)
            }
            Lookup::Stale => {
                self.run_fetch(key.path()).await?;
                self.current(key)
            }
        }
    }

    /// Fetch now, superseding any request already in flight for the key
    pub async fn refetch<T: Clone + 'static>(&self, key: &QueryKey<T>) -> ApiResult<T> {
        self.run_fetch(key.path()).await?;
        self.current(key)
    }

    fn current<T: Clone + 'static>(&self, key: &QueryKey<T>) -> ApiResult<T> {
        let inner = self.inner.borrow();
        let entry = inner
            .entries
            .get(key.path())
            .ok_or_else(ApiError::cancelled)?;
        match &entry.value {
            Some(value) => value
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| ApiError::decode(format!("Unexpected value type for {}", key.path()))),
            None => Err(ApiError::cancelled()),
        }
    }

    async fn run_fetch(&self, path: &str) -> ApiResult<()> {
        let (generation, fetcher) = {
            let mut inner = self.inner.borrow_mut();
            let entry = inner.entry(path);
            let fetcher = entry
                .fetcher
                .clone()
                .ok_or_else(|| ApiError::validation(format!("No fetcher registered for {}", path)))?;
            entry.generation += 1;
            entry.in_flight = Some(entry.generation);
            (entry.generation, fetcher)
        };
        let _guard = InFlightGuard {
            client: self,
            path,
            generation,
        };
        debug!(key = path, generation, "fetching");
        self.notify(path);

        let result = fetcher().await;

        let outcome = {
            let mut inner = self.inner.borrow_mut();
            let now = inner.clock.now();
            let entry = inner.entry(path);
            if entry.in_flight != Some(generation) {
                None
            } else {
                entry.in_flight = None;
                let outcome = match result {
                    Ok(value) => {
                        entry.confirmed = Some(value);
                        entry.error = None;
                        entry.updated_at = Some(now);
                        entry.invalidated = false;
                        // Edits the server accepted before this request started are part of its response
                        entry
                            .pending
                            .retain(|edit| edit.succeeded_at.map_or(true, |at| at >= generation));
                        entry.recompute();
                        Ok(())
                    }
                    Err(e) => {
                        entry.error = Some(e.clone());
                        Err(e)
                    }
                };
                entry.settled.notify_waiters();
                Some(outcome)
            }
        };

        match outcome {
            Some(outcome) => {
                if let Err(e) = &outcome {
                    debug!(key = path, error = %e, "fetch failed");
                }
                self.notify(path);
                outcome
            }
            None => {
                debug!(key = path, generation, "discarding superseded response");
                self.wait_settled(path).await
            }
        }
    }

    /// Wait until no fetch is in flight for `path`, then report the last outcome
    async fn wait_settled(&self, path: &str) -> ApiResult<()> {
        loop {
            let notify = {
                let mut inner = self.inner.borrow_mut();
                inner.entry(path).settled.clone()
            };
            let notified = notify.notified();
            let mut notified = std::pin::pin!(notified);
            notified.as_mut().enable();

            {
                let inner = self.inner.borrow();
                if let Some(entry) = inner.entries.get(path) {
                    if entry.in_flight.is_none() {
                        return match &entry.error {
                            Some(e) => Err(e.clone()),
                            None => Ok(()),
                        };
                    }
                }
            }

            notified.await;
        }
    }

    /// Abandon in-flight fetches for every key under `prefix`
    pub fn cancel(&self, prefix: &str) {
        let cancelled: Vec<String> = {
            let mut inner = self.inner.borrow_mut();
            let paths = inner.matching(prefix);
            paths
                .into_iter()
                .filter(|path| {
                    let entry = inner.entry(path);
                    if entry.in_flight.is_none() {
                        return false;
                    }
                    entry.supersede();
                    entry.settled.notify_waiters();
                    true
                })
                .collect()
        };
        for path in cancelled {
            debug!(key = %path, "cancelled in-flight fetch");
            self.notify(&path);
        }
    }

    /// Mark every key under `prefix` stale.
    ///
    /// Keys with subscribers are refetched before this returns; the rest
    /// wait for their next read.
    pub async fn invalidate(&self, prefix: &str) {
        let active: Vec<String> = {
            let mut inner = self.inner.borrow_mut();
            let paths = inner.matching(prefix);
            paths
                .into_iter()
                .filter(|path| {
                    let entry = inner.entry(path);
                    entry.invalidated = true;
                    !entry.listeners.is_empty() && entry.fetcher.is_some()
                })
                .collect()
        };
        debug!(prefix, active = active.len(), "invalidated");
        for path in &active {
            // Failures are recorded on the entry for its subscribers
            let _ = self.run_fetch(path).await;
        }
    }

    /// Drop every cached value and pending edit; registrations and
    /// subscriptions stay
    pub fn clear(&self) {
        let paths: Vec<String> = {
            let mut inner = self.inner.borrow_mut();
            for entry in inner.entries.values_mut() {
                entry.supersede();
                entry.confirmed = None;
                entry.value = None;
                entry.pending.clear();
                entry.error = None;
                entry.updated_at = None;
                entry.invalidated = false;
                entry.settled.notify_waiters();
            }
            inner.entries.keys().cloned().collect()
        };
        for path in paths {
            self.notify(&path);
        }
    }

    pub fn has_subscribers(&self, path: &str) -> bool {
        self.inner
            .borrow()
            .entries
            .get(path)
            .map(|entry| !entry.listeners.is_empty())
            .unwrap_or(false)
    }

    /// Call `listener` after every state change of `path`
    pub fn subscribe(&self, path: &str, listener: impl Fn(&QueryClient) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener += 1;
        let id = inner.next_listener;
        inner.entry(path).listeners.push((id, Rc::new(listener)));
        Subscription {
            client: Rc::downgrade(&self.inner),
            path: path.to_string(),
            id,
        }
    }

    /// Typed subscription receiving the new state of `key`
    pub fn watch<T: Clone + 'static>(
        &self,
        key: &QueryKey<T>,
        on_change: impl Fn(QueryState<T>) + 'static,
    ) -> Subscription {
        let watched = key.clone();
        self.subscribe(key.path(), move |client| on_change(client.read(&watched)))
    }

    fn notify(&self, path: &str) {
        let listeners: Vec<Listener> = {
            let inner = self.inner.borrow();
            match inner.entries.get(path) {
                Some(entry) => entry.listeners.iter().map(|(_, l)| l.clone()).collect(),
                None => return,
            }
        };
        for listener in listeners {
            listener(self);
        }
    }

    /// Fresh id for a speculative record
    pub fn next_local_id(&self) -> LocalId {
        let mut inner = self.inner.borrow_mut();
        inner.next_local_id += 1;
        LocalId(inner.next_local_id)
    }

    /// Apply a speculative edit to the value of `key` immediately.
    ///
    /// Keys without a value are left alone; the returned context then
    /// reports `is_applied() == false`.
    pub fn apply_optimistic<T, F>(&self, key: &QueryKey<T>, edit: F) -> MutationContext<T>
    where
        T: Clone + 'static,
        F: Fn(&T) -> T + 'static,
    {
        let context = {
            let mut inner = self.inner.borrow_mut();
            inner.next_edit += 1;
            let edit_id = inner.next_edit;
            let entry = inner.entry(key.path());
            let snapshot = entry
                .value
                .as_ref()
                .and_then(|v| v.downcast_ref::<T>())
                .cloned();
            if snapshot.is_some() {
                let apply: Edit = Rc::new(move |value: &AnyValue| {
                    value
                        .downcast_ref::<T>()
                        .map(|current| Rc::new(edit(current)) as AnyValue)
                });
                entry.pending.push(PendingEdit {
                    id: edit_id,
                    apply,
                    succeeded_at: None,
                });
                entry.recompute();
            }
            MutationContext {
                client: Rc::downgrade(&self.inner),
                path: key.path().to_string(),
                edit_id: snapshot.as_ref().map(|_| edit_id),
                snapshot,
            }
        };
        if context.is_applied() {
            self.notify(&context.path);
        }
        context
    }

    /// The server accepted the edit; it stays visible until a refetch
    /// started after this point replaces it
    pub fn confirm<T>(&self, mut context: MutationContext<T>) {
        let Some(edit_id) = context.edit_id.take() else {
            return;
        };
        let mut inner = self.inner.borrow_mut();
        let entry = inner.entry(&context.path);
        let generation = entry.generation;
        if let Some(edit) = entry.pending.iter_mut().find(|e| e.id == edit_id) {
            edit.succeeded_at = Some(generation);
        }
    }

    /// Like `confirm`, replacing the speculative edit with one built from
    /// the server's answer (e.g. the created record with its real id)
    pub fn confirm_with<T, F>(&self, mut context: MutationContext<T>, edit: F)
    where
        T: 'static,
        F: Fn(&T) -> T + 'static,
    {
        let Some(edit_id) = context.edit_id.take() else {
            return;
        };
        let replaced = {
            let mut inner = self.inner.borrow_mut();
            let entry = inner.entry(&context.path);
            let generation = entry.generation;
            let replaced = match entry.pending.iter_mut().find(|e| e.id == edit_id) {
                Some(pending) => {
                    pending.apply = Rc::new(move |value: &AnyValue| {
                        value
                            .downcast_ref::<T>()
                            .map(|current| Rc::new(edit(current)) as AnyValue)
                    });
                    pending.succeeded_at = Some(generation);
                    true
                }
                None => false,
            };
            if replaced {
                entry.recompute();
            }
            replaced
        };
        if replaced {
            self.notify(&context.path);
        }
    }

    /// Drop the edit and rebuild the value from what remains
    pub fn rollback<T>(&self, mut context: MutationContext<T>) {
        let Some(edit_id) = context.edit_id.take() else {
            return;
        };
        {
            let mut inner = self.inner.borrow_mut();
            let entry = inner.entry(&context.path);
            entry.pending.retain(|e| e.id != edit_id);
            entry.recompute();
        }
        debug!(key = %context.path, "rolled back speculative edit");
        self.notify(&context.path);
    }

    /// Number of speculative edits still layered over the confirmed value
    pub fn pending_edits(&self, path: &str) -> usize {
        self.inner
            .borrow()
            .entries
            .get(path)
            .map(|entry| entry.pending.len())
            .unwrap_or(0)
    }
}

/// Removes its listener when dropped
pub struct Subscription {
    client: Weak<RefCell<Inner>>,
    path: String,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.client.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                if let Some(entry) = inner.entries.get_mut(&self.path) {
                    entry.listeners.retain(|(id, _)| *id != self.id);
                }
            }
        }
    }
}
