pub mod action;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod selector;
pub mod store;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::action::{FetchAction, RequestId};
    pub use crate::catalog::{Catalog, CatalogEntry, CatalogSet, Section};
    pub use crate::config::Config;
    pub use crate::error::SelectError;
    pub use crate::fetch::{Fetcher, HttpFetcher};
    pub use crate::selector::CategorySelector;
    pub use crate::store::{Dispatch, FetchOutcome, Store};
    pub use crate::Genreview;
}

use std::sync::Arc;

use anyhow::Result;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::fetch::HttpFetcher;
use crate::selector::CategorySelector;
use crate::store::Store;

/// Async library entry point. Owns the catalog and a store backed by HTTP.
pub struct Genreview {
    catalog: Arc<Catalog>,
    store: Store<HttpFetcher>,
}

impl Genreview {
    /// Build from config. Must run inside a tokio runtime.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let catalog = Arc::new(cfg.catalog()?);
        let store = Store::new(HttpFetcher::from_config(cfg)?)?;
        Ok(Self { catalog, store })
    }

    pub fn catalog(&self) -> &Catalog { &self.catalog }
    pub fn store(&self) -> &Store<HttpFetcher> { &self.store }

    /// A fresh selector sharing this instance's catalog and store.
    pub fn selector(&self) -> CategorySelector<Store<HttpFetcher>> {
        CategorySelector::new(self.catalog.clone(), self.store.clone())
    }

    /// Wait for all in-flight fetches.
    pub async fn settle(&self) { self.store.settle().await }
}
