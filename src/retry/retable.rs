use std::sync::Arc;

use async_trait::async_trait;

use crate::dynamo::attributes::Attributes;
use crate::dynamo::frame::Frame;
use crate::dynamo::item::Item;
use crate::dynamo::region::Region;
use crate::dynamo::table::Table;
use crate::error::Result;
use crate::retry::{ReFrame, ReRegion, RetryPolicy, retry};

/// Table whose writes are retried and whose frames and region retry too.
#[derive(Debug, Clone)]
pub struct ReTable {
    origin: Arc<dyn Table>,
    policy: RetryPolicy,
}

impl ReTable {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Arc<dyn Table>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Arc<dyn Table>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }
}

#[async_trait]
impl Table for ReTable {
    async fn put(&self, attributes: &Attributes) -> Result<Item> {
        retry(&self.policy, "Table#put", || self.origin.put(attributes)).await
    }

    fn frame(&self) -> Arc<dyn Frame> {
        Arc::new(ReFrame::with_policy(self.origin.frame(), self.policy))
    }

    fn region(&self) -> Arc<dyn Region> {
        Arc::new(ReRegion::with_policy(self.origin.region(), self.policy))
    }

    fn name(&self) -> &str {
        self.origin.name()
    }

    async fn delete(&self, keys: &Attributes) -> Result<()> {
        retry(&self.policy, "Table#delete", || self.origin.delete(keys)).await
    }
}
