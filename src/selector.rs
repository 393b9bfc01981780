use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::action::RequestId;
use crate::catalog::{Catalog, CatalogEntry, Section};
use crate::error::SelectError;
use crate::store::Dispatch;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectionInput {
    segment: String,
    category: String,
    page: u32,
}

impl SelectionInput {
    fn new(segment: &str, category: &str, page: u32) -> Self {
        Self { segment: segment.to_string(), category: category.to_string(), page }
    }

    fn matches(&self, segment: &str, category: &str, page: u32) -> bool {
        self.page == page && self.segment == segment && self.category == category
    }
}

/// Resolves (route segment, category, page) to a catalog entry and dispatches
/// the fetch for it.
///
/// The selector re-evaluates only when its inputs change: calling [`select`]
/// twice with the same triple dispatches once. On failure the selection is
/// cleared and nothing is dispatched.
///
/// [`select`]: CategorySelector::select
pub struct CategorySelector<D> {
    catalog: Arc<Catalog>,
    store: D,
    last: Option<(SelectionInput, Result<CatalogEntry, SelectError>)>,
    last_request: Option<RequestId>,
    next_seq: u64,
    tx: watch::Sender<Option<CatalogEntry>>,
}

impl<D: Dispatch> CategorySelector<D> {
    pub fn new(catalog: Arc<Catalog>, store: D) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { catalog, store, last: None, last_request: None, next_seq: 0, tx }
    }

    pub fn select(&mut self, segment: &str, category: &str, page: u32) -> Result<&CatalogEntry, SelectError> {
        let current = match self.last.take() {
            Some((input, result)) if input.matches(segment, category, page) => self.last.insert((input, result)),
            _ => {
                let result = self.evaluate(segment, category, page);
                self.tx.send_replace(result.as_ref().ok().cloned());
                self.last.insert((SelectionInput::new(segment, category, page), result))
            }
        };
        current.1.as_ref().map_err(Clone::clone)
    }

    fn evaluate(&mut self, segment: &str, category: &str, page: u32) -> Result<CatalogEntry, SelectError> {
        let result = resolve(&self.catalog, segment, category).cloned();
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!(segment, category, page, error = %e, "selection failed");
                return Err(e);
            }
        };
        self.next_seq += 1;
        let id = RequestId::new(self.next_seq);
        debug!(segment, category, page, request_id = %id, "selected {}", entry.name);
        self.store.dispatch(entry.fetch_action(id.clone(), page));
        self.last_request = Some(id);
        Ok(entry)
    }

    /// Current selection; `None` before the first successful select and after a failed one.
    pub fn selection(&self) -> Option<&CatalogEntry> { self.last.as_ref().and_then(|(_, r)| r.as_ref().ok()) }

    /// Receiver that observes every selection change.
    pub fn subscribe(&self) -> watch::Receiver<Option<CatalogEntry>> { self.tx.subscribe() }

    /// Id of the most recent dispatch. Outcomes carrying an older id are stale.
    pub fn last_request(&self) -> Option<&RequestId> { self.last_request.as_ref() }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn store(&self) -> &D { &self.store }
}

/// Pure lookup half of selection: route segment to set, category to entry.
pub fn resolve<'a>(catalog: &'a Catalog, segment: &str, category: &str) -> Result<&'a CatalogEntry, SelectError> {
    let section = Section::from_segment(segment)
        .ok_or_else(|| SelectError::UnknownSection { segment: segment.to_string() })?;
    catalog
        .set(section)
        .find(category)
        .ok_or_else(|| SelectError::CategoryNotFound { section, category: category.to_string() })
}
