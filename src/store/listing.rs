//! Listing documents and the query vocabulary used against them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Field holding the asking price of a listing
pub const CURRENT_PRICE: &str = "current_price";
/// Field holding the ranking score of a listing
pub const POINTS: &str = "points";

/// A bike listing document.
///
/// Only `current_price` and `points` are interpreted; every other field is
/// carried through untouched so responses return the document verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(Map<String, Value>);

impl Listing {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Numeric value of a field, if present and numeric
    pub fn number(&self, field: &str) -> Option<f64> {
        self.0.get(field).and_then(Value::as_f64)
    }

    pub fn current_price(&self) -> Option<f64> {
        self.number(CURRENT_PRICE)
    }

    pub fn points(&self) -> Option<f64> {
        self.number(POINTS)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl TryFrom<Value> for Listing {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

/// Exclusive numeric bounds on a single field (`$gt` / `$lt`)
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRange {
    pub field: String,
    pub gt: Option<f64>,
    pub lt: Option<f64>,
}

impl FieldRange {
    fn matches(&self, listing: &Listing) -> bool {
        let Some(value) = listing.number(&self.field) else {
            return false;
        };
        self.gt.map_or(true, |bound| value > bound) && self.lt.map_or(true, |bound| value < bound)
    }
}

/// Conjunction of field conditions. An empty filter matches everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingFilter {
    conditions: Vec<FieldRange>,
}

impl ListingFilter {
    /// Filter matching every listing
    pub fn all() -> Self {
        Self::default()
    }

    /// Require `field` to be strictly greater than `bound`
    pub fn gt(mut self, field: impl Into<String>, bound: f64) -> Self {
        self.range_mut(field.into()).gt = Some(bound);
        self
    }

    /// Require `field` to be strictly less than `bound`
    pub fn lt(mut self, field: impl Into<String>, bound: f64) -> Self {
        self.range_mut(field.into()).lt = Some(bound);
        self
    }

    pub fn conditions(&self) -> &[FieldRange] {
        &self.conditions
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        self.conditions.iter().all(|c| c.matches(listing))
    }

    fn range_mut(&mut self, field: String) -> &mut FieldRange {
        let idx = match self.conditions.iter().position(|c| c.field == field) {
            Some(idx) => idx,
            None => {
                self.conditions.push(FieldRange {
                    field,
                    gt: None,
                    lt: None,
                });
                self.conditions.len() - 1
            }
        };
        &mut self.conditions[idx]
    }
}

/// Sort on a numeric field, highest value first
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
}

impl SortSpec {
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Compare two listings under this sort. Missing or non-numeric keys order
    /// below every number, so they come last.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let ordering = match (a.number(&self.field), b.number(&self.field)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        };
        ordering.reverse()
    }
}
