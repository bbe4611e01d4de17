//! View-facing subscription over a dataset load.
//!
//! A [`Subscription`] is what a view holds while it shows one dataset. It
//! exposes a `{data, loading, error}` state, re-runs its loader whenever the
//! dependency key changes, and ignores completions that no longer apply:
//!
//! - a load superseded by a newer dependency never writes its result
//! - a load finishing after the subscription was dropped writes nothing
//!
//! Neither case aborts the underlying fetch. It runs to completion and fills
//! the shared cache for whoever asks next.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use atlas_common::AtlasError;

/// Observable state of one subscription.
///
/// While `loading`, both `data` and `error` are `None`. Once settled, at most
/// one of them is set; both are `None` only for an absent optional resource.
#[derive(Debug)]
pub struct DatasetState<T> {
    pub data: Option<Arc<T>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Clone for DatasetState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<T> DatasetState<T> {
    pub fn pending() -> Self {
        Self { data: None, loading: true, error: None }
    }

    pub fn ready(data: Arc<T>) -> Self {
        Self { data: Some(data), loading: false, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { data: None, loading: false, error: Some(message.into()) }
    }

    /// Settled with nothing to show (optional resource not present).
    pub fn absent() -> Self {
        Self { data: None, loading: false, error: None }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading
    }

    fn from_outcome(outcome: Result<Option<Arc<T>>, AtlasError>) -> Self {
        match outcome {
            Ok(Some(data)) => Self::ready(data),
            Ok(None) => Self::absent(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

struct Lifecycle<D> {
    dependency: Option<D>,
    generation: u64,
    torn_down: bool,
}

struct Shared<T, D> {
    lifecycle: Mutex<Lifecycle<D>>,
    state: watch::Sender<DatasetState<T>>,
}

impl<T, D> Shared<T, D> {
    fn lock(&self) -> MutexGuard<'_, Lifecycle<D>> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Request lifecycle owned by one consumer. Dropping it tears it down.
pub struct Subscription<T, D> {
    shared: Arc<Shared<T, D>>,
}

impl<T, D> Default for Subscription<T, D>
where
    T: Send + Sync + 'static,
    D: PartialEq + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> Subscription<T, D>
where
    T: Send + Sync + 'static,
    D: PartialEq + Send + 'static,
{
    /// A subscription that has not started a load yet; it reports pending.
    pub fn new() -> Self {
        let (state, _) = watch::channel(DatasetState::pending());
        Self {
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle { dependency: None, generation: 0, torn_down: false }),
                state,
            }),
        }
    }

    /// Start `loader` for `dependency` unless it is already the current one.
    ///
    /// The state switches to pending synchronously and the load completes on
    /// a spawned task, so this must be called inside a tokio runtime. Returns
    /// whether a new load was started.
    pub fn use_dataset<F, Fut>(&self, dependency: D, loader: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>, AtlasError>> + Send + 'static,
    {
        self.start(dependency, move || {
            let fut = loader();
            async move { fut.await.map(Some) }
        })
    }

    /// Like [`use_dataset`](Self::use_dataset) for loaders whose `Ok(None)`
    /// means "no data" rather than an error.
    pub fn use_optional_dataset<F, Fut>(&self, dependency: D, loader: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Arc<T>>, AtlasError>> + Send + 'static,
    {
        self.start(dependency, loader)
    }

    fn start<F, Fut>(&self, dependency: D, loader: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<Arc<T>>, AtlasError>> + Send + 'static,
    {
        let generation = {
            let mut lifecycle = self.shared.lock();
            if lifecycle.dependency.as_ref() == Some(&dependency) {
                return false;
            }
            lifecycle.generation += 1;
            lifecycle.dependency = Some(dependency);
            self.shared.state.send_replace(DatasetState::pending());
            lifecycle.generation
        };

        let load = loader();
        let weak = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            let outcome = load.await;

            let Some(shared) = weak.upgrade() else {
                debug!(generation, "Subscription dropped before load finished; discarding result");
                return;
            };
            let lifecycle = shared.lock();
            if lifecycle.torn_down {
                debug!(generation, "Subscription torn down; discarding result");
                return;
            }
            if lifecycle.generation != generation {
                debug!(generation, current = lifecycle.generation, "Stale load result discarded");
                return;
            }
            shared.state.send_replace(DatasetState::from_outcome(outcome));
        });

        true
    }

    /// Current state snapshot.
    pub fn state(&self) -> DatasetState<T> {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified on every state transition.
    pub fn watch(&self) -> watch::Receiver<DatasetState<T>> {
        self.shared.state.subscribe()
    }

    /// Wait until the current load settles and return the settled state.
    ///
    /// Before the first `use_dataset` there is no load to wait for, and the
    /// pending state is returned as is.
    pub async fn settled(&self) -> DatasetState<T> {
        let mut rx = self.watch();
        if self.shared.lock().dependency.is_none() {
            return self.state();
        }
        let state = match rx.wait_for(DatasetState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        state
    }

    /// Tear the subscription down. Equivalent to dropping it.
    pub fn teardown(self) {}
}

impl<T, D: Clone> Subscription<T, D> {
    /// Dependency key of the most recent load.
    pub fn dependency(&self) -> Option<D> {
        self.shared.lock().dependency.clone()
    }
}

impl<T, D> Drop for Subscription<T, D> {
    fn drop(&mut self) {
        self.shared.lock().torn_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_common::{Dataset, FetchFailure};
    use tokio::sync::oneshot;

    type Gate = oneshot::Sender<Result<Arc<u32>, AtlasError>>;

    fn gated() -> (Gate, impl Future<Output = Result<Arc<u32>, AtlasError>> + Send + 'static) {
        let (tx, rx) = oneshot::channel();
        let fut = async move {
            rx.await
                .unwrap_or_else(|_| Err(AtlasError::NotFound("gate dropped".into())))
        };
        (tx, fut)
    }

    #[tokio::test]
    async fn test_starts_pending_then_ready() {
        let sub: Subscription<u32, u32> = Subscription::new();
        assert!(sub.state().loading);

        let (gate, fut) = gated();
        assert!(sub.use_dataset(1, move || fut));
        let state = sub.state();
        assert!(state.loading && state.data.is_none() && state.error.is_none());

        gate.send(Ok(Arc::new(42))).unwrap();
        let state = sub.settled().await;
        assert_eq!(state.data.as_deref(), Some(&42));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_settled_without_load_returns_pending() {
        let sub: Subscription<u32, u32> = Subscription::new();
        let state = tokio::time::timeout(std::time::Duration::from_secs(1), sub.settled())
            .await
            .expect("settled must not wait when no load was started");
        assert!(state.loading);
        assert!(state.data.is_none() && state.error.is_none());
    }

    #[tokio::test]
    async fn test_same_dependency_does_not_rerun() {
        let sub: Subscription<u32, u32> = Subscription::new();
        assert!(sub.use_dataset(1, || async { Ok(Arc::new(1)) }));
        assert!(!sub.use_dataset(1, || async { Ok(Arc::new(2)) }));
        assert_eq!(sub.settled().await.data.as_deref(), Some(&1));
        assert_eq!(sub.dependency(), Some(1));
    }

    #[tokio::test]
    async fn test_failure_becomes_error_message() {
        let sub: Subscription<u32, Dataset> = Subscription::new();
        sub.use_dataset(Dataset::Modules, || async {
            Err(FetchFailure::status(Dataset::Modules.key(), 500).into())
        });
        let state = sub.settled().await;
        assert!(state.data.is_none());
        assert_eq!(state.error.as_deref(), Some("Failed to load modules.json: HTTP 500"));
    }

    #[tokio::test]
    async fn test_superseded_result_is_discarded() {
        let sub: Subscription<u32, u32> = Subscription::new();
        let (old_gate, old) = gated();
        let (new_gate, new) = gated();

        sub.use_dataset(3, move || old);
        sub.use_dataset(5, move || new);

        old_gate.send(Ok(Arc::new(3))).unwrap();
        tokio::task::yield_now().await;
        assert!(sub.state().loading, "layer 3 result must not land under layer 5");

        new_gate.send(Ok(Arc::new(5))).unwrap();
        assert_eq!(sub.settled().await.data.as_deref(), Some(&5));
    }

    #[tokio::test]
    async fn test_absent_optional_resource() {
        let sub: Subscription<u32, u32> = Subscription::new();
        sub.use_optional_dataset(7, || async { Ok(None) });
        let state = sub.settled().await;
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_drop_before_completion_is_silent() {
        let sub: Subscription<u32, u32> = Subscription::new();
        let mut rx = sub.watch();
        let (gate, fut) = gated();
        sub.use_dataset(1, move || fut);
        let _ = rx.borrow_and_update();

        drop(sub);
        // The receiver keeps the channel open; nothing may be sent after teardown
        gate.send(Ok(Arc::new(1))).unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert!(!rx.has_changed().unwrap_or(false));
        assert!(rx.borrow().loading);
    }
}
