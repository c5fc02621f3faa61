use std::sync::Arc;

use async_trait::async_trait;

use crate::dynamo::conditions::{Condition, Conditions};
use crate::dynamo::frame::Frame;
use crate::dynamo::iterator::Cursor;
use crate::dynamo::table::Table;
use crate::dynamo::valve::Valve;
use crate::dynamo::value::AttributeValue;
use crate::error::Result;
use crate::retry::{ReIterator, ReTable, ReValve, RetryPolicy, retry};

/// Frame whose remote calls are retried, and whose refinements, valves,
/// cursors and table retry as well.
#[derive(Debug, Clone)]
pub struct ReFrame {
    origin: Arc<dyn Frame>,
    policy: RetryPolicy,
}

impl ReFrame {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Arc<dyn Frame>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Arc<dyn Frame>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }

    fn wrap(&self, origin: Arc<dyn Frame>) -> Arc<dyn Frame> {
        Arc::new(Self::with_policy(origin, self.policy))
    }
}

#[async_trait]
impl Frame for ReFrame {
    fn where_eq(&self, name: &str, value: AttributeValue) -> Arc<dyn Frame> {
        self.wrap(self.origin.where_eq(name, value))
    }

    fn where_condition(&self, name: &str, condition: Condition) -> Arc<dyn Frame> {
        self.wrap(self.origin.where_condition(name, condition))
    }

    fn where_all(&self, conditions: &Conditions) -> Arc<dyn Frame> {
        self.wrap(self.origin.where_all(conditions))
    }

    fn through(&self, valve: Arc<dyn Valve>) -> Arc<dyn Frame> {
        let valve = Arc::new(ReValve::with_policy(valve, self.policy));
        self.wrap(self.origin.through(valve))
    }

    fn table(&self) -> Arc<dyn Table> {
        Arc::new(ReTable::with_policy(self.origin.table(), self.policy))
    }

    fn iterator(&self) -> Box<dyn Cursor> {
        Box::new(ReIterator::with_policy(self.origin.iterator(), self.policy))
    }

    async fn size(&self) -> Result<usize> {
        retry(&self.policy, "Frame#size", || self.origin.size()).await
    }

    async fn is_empty(&self) -> Result<bool> {
        retry(&self.policy, "Frame#is_empty", || self.origin.is_empty()).await
    }
}
