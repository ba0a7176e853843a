//! Store gateway trait and startup wiring
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

use crate::config::StoreConfig;
use crate::store::listing::{Listing, ListingFilter, SortSpec};
use crate::store::memory::MemoryListingStore;
use crate::store::timeout::TimeoutListingStore;

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("listing store unavailable: {0}")]
    Unavailable(String),

    #[error("listing query timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("listing query failed: {0}")]
    Query(String),
}

/// Read access to the listing collection
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Return listings matching `filter`, ordered by `sort` when given and
    /// truncated to `limit` when given.
    async fn find_sorted(
        &self,
        filter: &ListingFilter,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, StoreError>;

    /// Check that the store can serve queries
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Stand-in used when the collection could not be opened at startup.
///
/// Every query fails with [`StoreError::Unavailable`], so the listener can
/// still come up and answer the routes that do not touch the store.
pub struct UnavailableListingStore {
    reason: String,
}

impl UnavailableListingStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ListingStore for UnavailableListingStore {
    async fn find_sorted(
        &self,
        _filter: &ListingFilter,
        _sort: Option<&SortSpec>,
        _limit: Option<usize>,
    ) -> Result<Vec<Listing>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

/// Open the listing collection described by `config`.
///
/// Never fails: a collection that cannot be loaded is logged and replaced by
/// an [`UnavailableListingStore`].
pub async fn establish_store(config: &StoreConfig) -> Arc<dyn ListingStore> {
    let inner: Arc<dyn ListingStore> = match &config.seed_path {
        None => {
            info!("No seed file configured, starting with an empty listing collection");
            Arc::new(MemoryListingStore::default())
        }
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            match MemoryListingStore::from_json_file(&path).await {
                Ok(store) => {
                    info!(path = %path, listings = store.len(), "Loaded listing collection");
                    Arc::new(store)
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Failed to load listing collection");
                    Arc::new(UnavailableListingStore::new(e.to_string()))
                }
            }
        }
    };

    let store: Arc<dyn ListingStore> = Arc::new(TimeoutListingStore::new(
        inner,
        Duration::from_millis(config.query_timeout_ms),
    ));

    match store.ping().await {
        Ok(()) => info!("Listing store ready"),
        Err(e) => error!(error = %e, "Listing store ping failed"),
    }

    store
}
