use axum::extract::{rejection::QueryRejection, Query, State};
use axum::response::Json as AxumJson;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::debug;

use crate::http_server::server::AppState;
use crate::session::Session;
use crate::store::listing::{CURRENT_PRICE, POINTS};
use crate::store::{Listing, ListingFilter, SortSpec};
use crate::utils::errors::{ApiError, ApiResult};

pub const LOGIN_SUCCESS: &str = "Successfully authenticated";
pub const ALREADY_AUTHENTICATED: &str = "Already authenticated";
pub const LOGOUT_SUCCESS: &str = "Successfully logged out";

/// Health check endpoint
pub async fn health() -> AxumJson<serde_json::Value> {
    AxumJson(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Mark the current session as authenticated
pub async fn login(session: Session) -> &'static str {
    if session.set_authenticated(true) {
        debug!("Session authenticated");
        LOGIN_SUCCESS
    } else {
        ALREADY_AUTHENTICATED
    }
}

/// Destroy the current session. Only reachable through the auth guard.
pub async fn logout(session: Session) -> ApiResult<&'static str> {
    session.destroy().await?;
    Ok(LOGOUT_SUCCESS)
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceMax {
    pub max_price: Number,
}

/// Price of the listing with the most points
pub async fn price_max(State(state): State<Arc<AppState>>) -> ApiResult<AxumJson<PriceMax>> {
    let top = state
        .listings
        .find_sorted(&ListingFilter::all(), Some(&SortSpec::descending(POINTS)), Some(1))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("no listings available".to_string()))?;

    let max_price = top
        .fields()
        .get(CURRENT_PRICE)
        .and_then(|value| match value {
            Value::Number(number) => Some(number.clone()),
            _ => None,
        })
        .ok_or_else(|| {
            ApiError::Internal("top-ranked listing has no numeric current_price".to_string())
        })?;

    Ok(AxumJson(PriceMax { max_price }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PriceRangeQuery {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl PriceRangeQuery {
    /// Both bounds, parsed as finite numbers
    pub fn bounds(&self) -> ApiResult<(f64, f64)> {
        Ok((
            parse_bound("min", self.min.as_deref())?,
            parse_bound("max", self.max.as_deref())?,
        ))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> ApiResult<f64> {
    let raw = raw.ok_or_else(|| {
        ApiError::InvalidQuery(format!("missing required parameter `{}`", name))
    })?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            ApiError::InvalidQuery(format!(
                "parameter `{}` must be a finite number, got {:?}",
                name, raw
            ))
        })
}

/// Every listing priced strictly between `min` and `max`
pub async fn price_range(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PriceRangeQuery>, QueryRejection>,
) -> ApiResult<AxumJson<Vec<Listing>>> {
    let Query(query) = query.map_err(|rejection| ApiError::InvalidQuery(rejection.body_text()))?;
    let (min, max) = query.bounds()?;

    let filter = ListingFilter::all()
        .gt(CURRENT_PRICE, min)
        .lt(CURRENT_PRICE, max);
    let listings = state.listings.find_sorted(&filter, None, None).await?;

    Ok(AxumJson(listings))
}
