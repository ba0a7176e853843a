//! Query deadline decorator
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::store::gateway::{ListingStore, StoreError};
use crate::store::listing::{Listing, ListingFilter, SortSpec};

/// Bounds every call on the wrapped store by a fixed deadline
pub struct TimeoutListingStore {
    inner: Arc<dyn ListingStore>,
    timeout: Duration,
}

impl TimeoutListingStore {
    pub fn new(inner: Arc<dyn ListingStore>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl ListingStore for TimeoutListingStore {
    async fn find_sorted(
        &self,
        filter: &ListingFilter,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, StoreError> {
        let query = self.inner.find_sorted(filter, sort, limit);
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Listing query timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.inner.ping())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}
