use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::conditions::Conditions;
use crate::dynamo::dosage::Dosage;
use crate::dynamo::valve::Valve;
use crate::error::Result;
use crate::retry::{ReDosage, RetryPolicy, retry};

/// Valve whose fetches and counts are retried; fetched pages retry too.
#[derive(Debug, Clone)]
pub struct ReValve {
    origin: Arc<dyn Valve>,
    policy: RetryPolicy,
}

impl ReValve {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Arc<dyn Valve>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Arc<dyn Valve>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }
}

#[async_trait]
impl Valve for ReValve {
    async fn fetch(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
        keys: &[String],
    ) -> Result<Box<dyn Dosage>> {
        let dosage = retry(&self.policy, "Valve#fetch", || {
            self.origin.fetch(credentials.clone(), table, conditions, keys)
        })
        .await?;
        Ok(Box::new(ReDosage::with_policy(dosage, self.policy)))
    }

    async fn count(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
    ) -> Result<usize> {
        retry(&self.policy, "Valve#count", || {
            self.origin.count(credentials.clone(), table, conditions)
        })
        .await
    }
}
