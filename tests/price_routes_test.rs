//! Price query handlers over an in-memory listing collection

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use bike_price_api::store::{
    Listing, ListingFilter, ListingStore, SortSpec, StoreError, TimeoutListingStore,
    UnavailableListingStore,
};
use common::{body_json, body_text, test_config, TestApp};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn bikes() -> Value {
    json!([
        { "name": "Roadster", "current_price": 100, "points": 5 },
        { "name": "Commuter", "current_price": 50, "points": 3 },
        { "name": "Racer", "current_price": 300, "points": 9, "frame": { "material": "carbon" } },
    ])
}

#[tokio::test]
async fn test_pricemax_returns_price_of_top_ranked_listing() {
    let app = TestApp::with_listings(bikes());

    let response = app.get("/api/pricemax").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "maxPrice": 300 }));
}

#[tokio::test]
async fn test_pricemax_keeps_fractional_prices() {
    let app = TestApp::with_listings(json!([
        { "current_price": 19.99, "points": 1 },
        { "current_price": 5, "points": 0.5 },
    ]));

    let body = body_json(app.get("/api/pricemax").await).await;
    assert_eq!(body, json!({ "maxPrice": 19.99 }));
}

#[tokio::test]
async fn test_pricemax_ignores_listings_without_points() {
    let app = TestApp::with_listings(json!([
        { "current_price": 999 },
        { "current_price": 10, "points": -1 },
    ]));

    let body = body_json(app.get("/api/pricemax").await).await;
    assert_eq!(body, json!({ "maxPrice": 10 }));
}

#[tokio::test]
async fn test_pricemax_on_empty_collection_is_not_found() {
    let app = TestApp::with_listings(json!([]));

    let response = app.get("/api/pricemax").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_pricemax_without_price_is_internal_error() {
    let app = TestApp::with_listings(json!([{ "points": 10, "current_price": "n/a" }]));

    let response = app.get("/api/pricemax").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_pricerange_excludes_boundaries() {
    let app = TestApp::with_listings(json!([
        { "id": 1, "current_price": 10 },
        { "id": 2, "current_price": 15 },
        { "id": 3, "current_price": 20 },
        { "id": 4, "current_price": 19.5 },
        { "id": 5, "current_price": 25 },
        { "id": 6 },
    ]));

    let response = app.get("/api/pricerange?min=10&max=20").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!([
            { "id": 2, "current_price": 15 },
            { "id": 4, "current_price": 19.5 },
        ])
    );
}

#[tokio::test]
async fn test_pricerange_returns_documents_verbatim() {
    let app = TestApp::with_listings(bikes());

    let body = body_json(app.get("/api/pricerange?min=200&max=400").await).await;
    assert_eq!(body, json!([bikes()[2]]));
}

#[tokio::test]
async fn test_pricerange_keeps_field_order() {
    let app = TestApp::with_listings(json!([
        { "name": "Racer", "current_price": 300, "brand": "Acme", "points": 1 },
    ]));

    let body = body_text(app.get("/api/pricerange?min=1&max=400").await).await;
    assert_eq!(
        body,
        r#"[{"name":"Racer","current_price":300,"brand":"Acme","points":1}]"#
    );
}

#[tokio::test]
async fn test_pricerange_with_inverted_bounds_is_empty() {
    let app = TestApp::with_listings(bikes());

    for uri in [
        "/api/pricerange?min=400&max=10",
        "/api/pricerange?min=100&max=100",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }
}

#[tokio::test]
async fn test_pricerange_rejects_missing_or_malformed_bounds() {
    let app = TestApp::with_listings(bikes());

    for uri in [
        "/api/pricerange",
        "/api/pricerange?min=10",
        "/api/pricerange?max=10",
        "/api/pricerange?min=ten&max=20",
        "/api/pricerange?min=10&max=NaN",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body_json(response).await["error"], "INVALID_QUERY");
    }
}

#[tokio::test]
async fn test_pricerange_is_public() {
    let app = TestApp::with_listings(bikes());
    let response = app.get("/api/pricerange?min=0&max=1000").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unavailable_store_is_service_unavailable() {
    let app = TestApp::new(
        &test_config(),
        Arc::new(UnavailableListingStore::new("seed file missing")),
    );

    for uri in ["/api/pricemax", "/api/pricerange?min=1&max=2"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "STORE_UNAVAILABLE");
    }

    // Routes that do not touch the store keep working
    assert_eq!(app.get("/login").await.status(), StatusCode::OK);
}

struct StalledStore;

#[async_trait]
impl ListingStore for StalledStore {
    async fn find_sorted(
        &self,
        _filter: &ListingFilter,
        _sort: Option<&SortSpec>,
        _limit: Option<usize>,
    ) -> Result<Vec<Listing>, StoreError> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out() {
    let store = TimeoutListingStore::new(Arc::new(StalledStore), Duration::from_millis(250));
    let app = TestApp::new(&test_config(), Arc::new(store));

    let response = app.get("/api/pricemax").await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["error"], "STORE_TIMEOUT");
}
