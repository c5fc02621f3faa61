use async_trait::async_trait;

use crate::dynamo::attributes::Attributes;
use crate::dynamo::dosage::Dosage;
use crate::error::Result;
use crate::retry::{RetryPolicy, retry};

/// Dosage whose continuation fetch is retried.
pub struct ReDosage {
    origin: Box<dyn Dosage>,
    policy: RetryPolicy,
}

impl ReDosage {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Box<dyn Dosage>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Box<dyn Dosage>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }
}

#[async_trait]
impl Dosage for ReDosage {
    fn items(&self) -> &[Attributes] {
        self.origin.items()
    }

    fn has_next(&self) -> bool {
        self.origin.has_next()
    }

    async fn next(&self) -> Result<Box<dyn Dosage>> {
        let next = retry(&self.policy, "Dosage#next", || self.origin.next()).await?;
        Ok(Box::new(ReDosage::with_policy(next, self.policy)))
    }
}
