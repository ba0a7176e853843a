//! In-process listing collection
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use crate::store::gateway::{ListingStore, StoreError};
use crate::store::listing::{Listing, ListingFilter, SortSpec};

/// Listing collection held in memory, optionally seeded from a JSON file
#[derive(Default)]
pub struct MemoryListingStore {
    listings: Vec<Listing>,
}

impl MemoryListingStore {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Load a collection from a file containing a JSON array of documents
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            StoreError::Unavailable(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let documents: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| StoreError::Unavailable(format!("invalid listing file: {}", e)))?;

        let listings = documents
            .into_iter()
            .enumerate()
            .map(|(idx, doc)| {
                Listing::try_from(doc).map_err(|_| {
                    StoreError::Unavailable(format!("document {} is not a JSON object", idx))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(listings))
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn find_sorted(
        &self,
        filter: &ListingFilter,
        sort: Option<&SortSpec>,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>, StoreError> {
        let mut matched: Vec<Listing> = self
            .listings
            .iter()
            .filter(|listing| filter.matches(listing))
            .cloned()
            .collect();

        // stable, so ties keep insertion order
        if let Some(sort) = sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }
        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::listing::{CURRENT_PRICE, POINTS};
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> MemoryListingStore {
        MemoryListingStore::from_json_str(
            &json!([
                {"name": "a", "points": 5, "current_price": 100},
                {"name": "b", "points": 3, "current_price": 50},
                {"name": "c", "points": 9, "current_price": 300},
            ])
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_sort_descending_with_limit() {
        let result = store()
            .find_sorted(&ListingFilter::all(), Some(&SortSpec::descending(POINTS)), Some(1))
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].current_price(), Some(300.0));
    }

    #[tokio::test]
    async fn test_filter_without_sort_keeps_insertion_order() {
        let filter = ListingFilter::all().gt(CURRENT_PRICE, 40.0).lt(CURRENT_PRICE, 200.0);
        let result = store().find_sorted(&filter, None, None).await.unwrap();

        let names: Vec<_> = result
            .iter()
            .map(|l| l.fields()["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_len() {
        assert!(MemoryListingStore::default().is_empty());
        assert_eq!(store().len(), 3);
    }

    #[test]
    fn test_rejects_non_array_file() {
        assert!(MemoryListingStore::from_json_str(r#"{"bikes": []}"#).is_err());
        assert!(MemoryListingStore::from_json_str(r#"[1, 2]"#).is_err());
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bikes.json");
        tokio::fs::write(&path, r#"[{"current_price": 12, "brand": "Trek"}]"#)
            .await
            .unwrap();

        let store = MemoryListingStore::from_json_file(&path).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
