//! In-memory read cache with in-flight request deduplication.
//!
//! # Design
//! `QueryCache` is an explicit object, shared through `Arc`, rather than a
//! process-wide singleton. Entries are type-erased (`Arc<dyn Any>`) and keyed
//! by [`QueryKey`], an ordered list of parts such as
//! `["users", "list", "pageNumber=1", "pageSize=10"]`. Invalidation works on
//! key prefixes, so invalidating `["users"]` drops every users entry.
//!
//! [`QueryCache::fetch`] lets exactly one caller per key run the fetcher;
//! concurrent callers with the same key wait on a `watch` channel for its
//! outcome. The in-flight slot lives exactly as long as the leading fetch, so
//! the deduplication window is the request's lifetime. When a key is
//! invalidated while its fetch is in flight, the waiters still receive the
//! outcome but it is not stored, and later callers start a fresh fetch
//! rather than joining it. If the leading future is dropped or aborted, its
//! slot is released and the next waiter takes over.
//!
//! The mutex is never held across an `.await`.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::abort::AbortSignal;
use crate::error::ApiError;

type Shared = Arc<dyn Any + Send + Sync>;
type Outcome = Option<Result<Shared, ApiError>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        Self(vec![root.to_string()])
    }

    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Append one discriminator.
    pub fn with(mut self, part: impl fmt::Display) -> Self {
        self.0.push(part.to_string());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct Entry {
    value: Shared,
    fetched_at: Instant,
}

struct InFlight {
    id: u64,
    rx: watch::Receiver<Outcome>,
    invalidated: bool,
}

#[derive(Default)]
struct State {
    entries: HashMap<QueryKey, Entry>,
    in_flight: HashMap<QueryKey, InFlight>,
    next_id: u64,
}

pub struct QueryCache {
    state: Mutex<State>,
    stale_time: Duration,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("QueryCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .field("stale_time", &self.stale_time)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: Shared) -> Result<Arc<T>, ApiError> {
    value
        .downcast::<T>()
        .map_err(|_| ApiError::CacheType(key.to_string()))
}

/// Releases the in-flight slot if the leading fetch never finishes.
struct FlightGuard<'a> {
    cache: &'a QueryCache,
    key: &'a QueryKey,
    id: u64,
    finished: bool,
}

impl FlightGuard<'_> {
    fn finish(mut self, outcome: &Result<Shared, ApiError>) {
        self.finished = true;
        let mut state = self.cache.lock();
        let invalidated = match state.in_flight.get(self.key) {
            Some(flight) if flight.id == self.id => flight.invalidated,
            _ => true,
        };
        if state
            .in_flight
            .get(self.key)
            .is_some_and(|flight| flight.id == self.id)
        {
            state.in_flight.remove(self.key);
        }
        match outcome {
            Ok(value) if !invalidated => {
                state.entries.insert(
                    self.key.clone(),
                    Entry {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                    },
                );
            }
            Ok(_) => trace!(key = %self.key, "discarding result invalidated mid-flight"),
            Err(_) => {}
        }
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.cache.lock();
        if state
            .in_flight
            .get(self.key)
            .is_some_and(|flight| flight.id == self.id)
        {
            trace!(key = %self.key, "fetch dropped before completing");
            state.in_flight.remove(self.key);
        }
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            stale_time,
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached value for `key`, fresh or not.
    pub fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let value = self.lock().entries.get(key).map(|e| e.value.clone())?;
        value.downcast::<T>().ok()
    }

    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        self.lock().entries.insert(
            key,
            Entry {
                value: Arc::new(value),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop every entry under `prefix` and keep in-flight fetches under it
    /// from storing their results. Returns the number of entries dropped.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - state.entries.len();
        for (_, flight) in state
            .in_flight
            .iter_mut()
            .filter(|(key, _)| key.starts_with(prefix))
        {
            flight.invalidated = true;
        }
        debug!(prefix = %prefix, dropped, "invalidated cache entries");
        dropped
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.lock().in_flight.contains_key(key)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        for flight in state.in_flight.values_mut() {
            flight.invalidated = true;
        }
    }

    /// Return the fresh cached value for `key`, or run `fetcher` once for all
    /// concurrent callers with the same key.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.fetch_with_signal(key, None, fetcher).await
    }

    /// Like [`QueryCache::fetch`], but a caller waiting on another caller's
    /// fetch stops waiting with `Aborted` once its own `signal` fires.
    ///
    /// An in-flight fetch is only joined while its key has not been
    /// invalidated; a caller arriving after an invalidation starts a fresh
    /// fetch. Waiters whose leader was aborted compete for the slot again
    /// instead of inheriting the abort.
    pub async fn fetch_with_signal<T, F, Fut>(
        &self,
        key: &QueryKey,
        signal: Option<&AbortSignal>,
        fetcher: F,
    ) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let (tx, id) = loop {
            let mut rx = {
                let mut state = self.lock();
                if let Some(entry) = state.entries.get(key) {
                    if entry.fetched_at.elapsed() < self.stale_time {
                        trace!(key = %key, "cache hit");
                        let value = entry.value.clone();
                        drop(state);
                        return downcast(key, value);
                    }
                }
                match state.in_flight.get(key) {
                    Some(flight) if !flight.invalidated => flight.rx.clone(),
                    _ => {
                        state.next_id += 1;
                        let id = state.next_id;
                        let (tx, rx) = watch::channel(None);
                        // Replaces a stale flight; its leader sees the id
                        // mismatch and neither stores nor releases.
                        state.in_flight.insert(
                            key.clone(),
                            InFlight {
                                id,
                                rx,
                                invalidated: false,
                            },
                        );
                        break (tx, id);
                    }
                }
            };

            trace!(key = %key, "joining in-flight request");
            let outcome: Outcome = match signal {
                Some(signal) => tokio::select! {
                    changed = rx.wait_for(Option::is_some) => changed.ok().and_then(|outcome| (*outcome).clone()),
                    _ = signal.aborted() => return Err(ApiError::Aborted),
                },
                // `Err` means the leader was dropped; compete for the slot again.
                None => rx
                    .wait_for(Option::is_some)
                    .await
                    .ok()
                    .and_then(|outcome| (*outcome).clone()),
            };
            match outcome {
                Some(Err(ApiError::Aborted)) => trace!(key = %key, "leader aborted, retrying"),
                Some(outcome) => return outcome.and_then(|value| downcast(key, value)),
                None => {}
            }
        };

        trace!(key = %key, "fetching");
        let guard = FlightGuard {
            cache: self,
            key,
            id,
            finished: false,
        };
        let result = fetcher().await.map(Arc::new);
        let shared: Result<Shared, ApiError> = match &result {
            Ok(value) => Ok(value.clone() as Shared),
            Err(e) => Err(e.clone()),
        };
        guard.finish(&shared);
        tx.send_replace(Some(shared));
        result
    }
}
