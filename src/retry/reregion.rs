use std::sync::Arc;

use async_trait::async_trait;

use crate::dynamo::region::Region;
use crate::dynamo::table::Table;
use crate::dynamo::transport::Transport;
use crate::error::Result;
use crate::retry::{ReTable, RetryPolicy, retry};

/// Region whose tables retry.
#[derive(Debug, Clone)]
pub struct ReRegion {
    origin: Arc<dyn Region>,
    policy: RetryPolicy,
}

impl ReRegion {
    /// Wrap `origin` with the default [`RetryPolicy`].
    pub fn new(origin: Arc<dyn Region>) -> Self {
        Self::with_policy(origin, RetryPolicy::default())
    }

    /// Wrap `origin`, retrying as `policy` says.
    pub fn with_policy(origin: Arc<dyn Region>, policy: RetryPolicy) -> Self {
        Self { origin, policy }
    }
}

#[async_trait]
impl Region for ReRegion {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        retry(&self.policy, "Region#aws", || self.origin.aws()).await
    }

    fn table(&self, name: &str) -> Arc<dyn Table> {
        Arc::new(ReTable::with_policy(self.origin.table(name), self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::attributes::Attributes;
    use crate::mock::MkData;

    #[tokio::test]
    async fn whole_chain_is_wrapped() {
        let data = MkData::new().with_table("users", &["id"]).unwrap();
        let region = ReRegion::new(data.region());
        let table = region.table("users");
        table.put(&Attributes::new().with("id", "a")).await.unwrap();

        assert!(format!("{:?}", table).starts_with("ReTable"));
        assert!(format!("{:?}", table.frame()).starts_with("ReFrame"));
        assert!(format!("{:?}", table.region()).starts_with("ReRegion"));
        assert!(format!("{:?}", table.frame().table()).starts_with("ReTable"));
        assert_eq!(table.frame().size().await.unwrap(), 1);
    }
}
