use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::action::FetchAction;
use crate::catalog::Section;
use crate::fetch::Fetcher;

/// Accepts deferred fetch actions. Implementations must not block; the caller
/// never observes the result.
pub trait Dispatch {
    fn dispatch(&self, action: FetchAction);
}

impl<T: Dispatch + ?Sized> Dispatch for &T {
    fn dispatch(&self, action: FetchAction) { (**self).dispatch(action) }
}

impl<T: Dispatch + ?Sized> Dispatch for Arc<T> {
    fn dispatch(&self, action: FetchAction) { (**self).dispatch(action) }
}

/// Result of one completed action.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub action: FetchAction,
    pub result: Result<Value, String>,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool { self.result.is_ok() }
}

/// Number of recent actions kept by [`Store::dispatched`].
pub const DISPATCH_LOG_CAP: usize = 256;

#[derive(Default)]
struct StoreState {
    dispatched: VecDeque<FetchAction>,
    dispatch_count: usize,
    latest: HashMap<Section, FetchOutcome>,
    completed: usize,
}

impl StoreState {
    fn record(&mut self, action: FetchAction) {
        if self.dispatched.len() == DISPATCH_LOG_CAP { self.dispatched.pop_front(); }
        self.dispatched.push_back(action);
        self.dispatch_count += 1;
    }
}

/// Shared application store. Each dispatched action runs on its own task;
/// whichever finishes last for a section becomes that section's `latest`.
pub struct Store<F> {
    fetcher: Arc<F>,
    state: Arc<Mutex<StoreState>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    runtime: Handle,
}

impl<F> Clone for Store<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            state: self.state.clone(),
            tasks: self.tasks.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<F: Fetcher + 'static> Store<F> {
    /// Bind to the current tokio runtime.
    pub fn new(fetcher: F) -> Result<Self> {
        let runtime = Handle::try_current().context("store must be created inside a tokio runtime")?;
        Ok(Self::with_handle(fetcher, runtime))
    }

    pub fn with_handle(fetcher: F, runtime: Handle) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            state: Arc::new(Mutex::new(StoreState::default())),
            tasks: Arc::new(Mutex::new(Vec::new())),
            runtime,
        }
    }

    pub fn fetcher(&self) -> &F { &self.fetcher }

    /// Wait for every task dispatched so far.
    pub async fn settle(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.tasks));
            if pending.is_empty() { break; }
            for res in futures::future::join_all(pending).await {
                if let Err(e) = res { warn!(error = %e, "fetch task did not complete"); }
            }
        }
    }

    /// Most recently completed outcome for a section.
    pub fn latest(&self, section: Section) -> Option<FetchOutcome> { lock(&self.state).latest.get(&section).cloned() }

    /// The last [`DISPATCH_LOG_CAP`] actions dispatched, oldest first.
    pub fn dispatched(&self) -> Vec<FetchAction> { lock(&self.state).dispatched.iter().cloned().collect() }

    /// Total actions dispatched over the store's lifetime.
    pub fn dispatch_count(&self) -> usize { lock(&self.state).dispatch_count }

    pub fn completed(&self) -> usize { lock(&self.state).completed }

    pub fn in_flight(&self) -> usize { lock(&self.tasks).iter().filter(|h| !h.is_finished()).count() }
}

impl<F: Fetcher + 'static> Dispatch for Store<F> {
    fn dispatch(&self, action: FetchAction) {
        info!(request_id = %action.id, section = %action.kind, category = %action.category, page = action.page, url = %action.url, "dispatching fetch");
        lock(&self.state).record(action.clone());

        let fetcher = self.fetcher.clone();
        let state = self.state.clone();
        let handle = self.runtime.spawn(async move {
            let result = fetcher.fetch(&action.url).await.map_err(|e| format!("{e:#}"));
            if let Err(e) = &result {
                warn!(request_id = %action.id, url = %action.url, error = %e, "fetch failed");
            }
            let mut st = lock(&state);
            st.completed += 1;
            st.latest.insert(action.kind, FetchOutcome { action, result });
        });

        let mut tasks = lock(&self.tasks);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}

// A panicking fetch task must not wedge the store
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> { m.lock().unwrap_or_else(|e| e.into_inner()) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::RequestId;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;

    struct CannedFetcher {
        responses: HashMap<String, Value>,
    }

    #[async_trait]
    impl Fetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<Value> {
            self.responses.get(url).cloned().ok_or_else(|| anyhow!("no route for {url}"))
        }
    }

    fn action(seq: u64, kind: Section, url: &str) -> FetchAction {
        FetchAction { id: RequestId::new(seq), kind, category: "Drama".into(), page: 1, url: url.into() }
    }

    fn store() -> Store<CannedFetcher> {
        let responses = [("/drama?&page=1".to_string(), json!({"results": [{"name": "The Wire"}]}))].into_iter().collect();
        Store::new(CannedFetcher { responses }).unwrap()
    }

    #[test]
    fn new_outside_runtime_is_an_error() {
        assert!(Store::new(CannedFetcher { responses: HashMap::new() }).is_err());
    }

    #[tokio::test]
    async fn dispatch_records_and_completes() {
        let store = store();
        store.dispatch(action(1, Section::Series, "/drama?&page=1"));
        assert_eq!(store.dispatched().len(), 1);

        store.settle().await;
        assert_eq!(store.in_flight(), 0);
        assert_eq!(store.completed(), 1);
        let outcome = store.latest(Section::Series).unwrap();
        assert!(outcome.is_ok());
        assert_eq!(outcome.action.id.seq, 1);
        assert_eq!(outcome.result.unwrap()["results"][0]["name"], "The Wire");
        assert!(store.latest(Section::Movies).is_none());
    }

    #[tokio::test]
    async fn failures_are_recorded_not_raised() {
        let store = store();
        store.dispatch(action(1, Section::Movies, "/missing?&page=1"));
        store.settle().await;

        let outcome = store.latest(Section::Movies).unwrap();
        assert!(!outcome.is_ok());
        assert!(outcome.result.unwrap_err().contains("no route"));
    }

    #[tokio::test]
    async fn dispatch_through_shared_handle() {
        let store = Arc::new(store());
        let as_dyn: &dyn Dispatch = &*store;
        as_dyn.dispatch(action(1, Section::Series, "/drama?&page=1"));
        store.dispatch(action(2, Section::Series, "/drama?&page=1"));
        store.settle().await;
        assert_eq!(store.completed(), 2);
        let seqs: Vec<u64> = store.dispatched().iter().map(|a| a.id.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn dispatch_log_keeps_only_recent_actions() {
        let store = store();
        let total = DISPATCH_LOG_CAP as u64 + 44;
        for seq in 1..=total {
            store.dispatch(action(seq, Section::Series, "/drama?&page=1"));
        }
        store.settle().await;

        let log = store.dispatched();
        assert_eq!(log.len(), DISPATCH_LOG_CAP);
        assert_eq!(log.first().map(|a| a.id.seq), Some(45));
        assert_eq!(log.last().map(|a| a.id.seq), Some(total));
        assert_eq!(store.dispatch_count(), total as usize);
        assert_eq!(store.completed(), total as usize);
    }
}
