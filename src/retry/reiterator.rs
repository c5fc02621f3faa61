use async_trait::async_trait;

use crate::dynamo::item::Item;
use crate::dynamo::iterator::Cursor;
use crate::error::Result;
use crate::retry::{RetryPolicy, retry};

/// Cursor whose calls are retried.
///
/// Running past the end is not a transient failure, so `next` reports
/// [`Error::Exhausted`](crate::error::Error::Exhausted) at once.
pub struct ReIterator {
    origin: Box<dyn Cursor>,
    policy: RetryPolicy,
}

impl ReIterator {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Box<dyn Cursor>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Box<dyn Cursor>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }
}

#[async_trait]
impl Cursor for ReIterator {
    async fn has_next(&self) -> Result<bool> {
        retry(&self.policy, "Iterator#has_next", || self.origin.has_next()).await
    }

    async fn next(&self) -> Result<Item> {
        retry(&self.policy, "Iterator#next", || self.origin.next()).await
    }

    async fn remove(&self) -> Result<()> {
        retry(&self.policy, "Iterator#remove", || self.origin.remove()).await
    }
}
