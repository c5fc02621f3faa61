use std::fmt;

use async_trait::async_trait;

use crate::dynamo::attributes::{AttributeUpdates, Attributes};
use crate::dynamo::request::PageRequest;
use crate::error::Result;

/// Read/write capacity units a call consumed, when the store reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Capacity(pub Option<f64>);

impl Capacity {
    /// Capacity reported by the store.
    pub fn units(units: f64) -> Self {
        Self(Some(units))
    }

    /// No capacity was reported.
    pub fn unknown() -> Self {
        Self(None)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(units) => write!(f, "{units:.2} units"),
            None => Ok(()),
        }
    }
}

/// One page returned by a query or scan.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Attributes>,
    pub last_evaluated_key: Option<Attributes>,
    /// Number of matching records, also set for `Select::Count`.
    pub count: usize,
    pub capacity: Capacity,
}

/// Result of a single-item call with the capacity it consumed.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    pub value: T,
    pub capacity: Capacity,
}

impl<T> Reply<T> {
    /// `value` and the capacity spent on it.
    pub fn new(value: T, capacity: Capacity) -> Self {
        Self { value, capacity }
    }
}

/// Operations the frames need from a DynamoDB endpoint.
///
/// A handle is obtained from [`Credentials::aws`](crate::auth::Credentials::aws)
/// for each remote operation and dropped when it completes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one query or scan page.
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;

    /// Point read of `attributes` (all of them when empty).
    async fn get_item(
        &self,
        table: &str,
        key: &Attributes,
        attributes: &[String],
        consistent: bool,
    ) -> Result<Reply<Option<Attributes>>>;

    /// Create or replace a whole record.
    async fn put_item(&self, table: &str, item: &Attributes) -> Result<Reply<()>>;

    /// Apply `updates`, optionally only when `expected` still holds.
    /// Returns the updated attributes with their new values.
    async fn update_item(
        &self,
        table: &str,
        key: &Attributes,
        updates: &AttributeUpdates,
        expected: Option<&Attributes>,
    ) -> Result<Reply<Attributes>>;

    async fn delete_item(
        &self,
        table: &str,
        key: &Attributes,
        expected: Option<&Attributes>,
    ) -> Result<Reply<()>>;

    /// Names of the table's primary key attributes, hash key first.
    async fn describe_keys(&self, table: &str) -> Result<Vec<String>>;
}
