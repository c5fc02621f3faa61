use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::table::{AwsTable, Table};
use crate::dynamo::transport::Transport;
use crate::error::Result;

/// Entry point to the tables reachable with one set of credentials.
#[async_trait]
pub trait Region: Send + Sync + fmt::Debug {
    /// A transport handle to use for one operation.
    async fn aws(&self) -> Result<Box<dyn Transport>>;

    /// Handle of table `name`; nothing is checked remotely.
    fn table(&self, name: &str) -> Arc<dyn Table>;
}

/// Region bound to credentials.
#[derive(Clone)]
pub struct Simple {
    credentials: Arc<dyn Credentials>,
}

impl Simple {
    /// Region over `credentials`.
    pub fn new(credentials: impl Credentials + 'static) -> Self {
        Self::shared(Arc::new(credentials))
    }

    /// Region over credentials shared with others.
    pub fn shared(credentials: Arc<dyn Credentials>) -> Self {
        Self { credentials }
    }
}

impl fmt::Debug for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({})", self.credentials)
    }
}

#[async_trait]
impl Region for Simple {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        self.credentials.aws().await
    }

    fn table(&self, name: &str) -> Arc<dyn Table> {
        Arc::new(AwsTable::new(
            self.credentials.clone(),
            Arc::new(self.clone()),
            name,
        ))
    }
}

/// Region that prepends a prefix to every table name, e.g. per environment.
///
/// Its tables report the prefixed region as theirs and reach the store
/// through the origin's transports. Wrap it in a
/// [`ReRegion`](crate::retry::ReRegion) to retry them.
#[derive(Clone)]
pub struct Prefixed {
    origin: Arc<dyn Region>,
    prefix: String,
}

impl Prefixed {
    /// Tables of `origin` named with `prefix` in front.
    pub fn new(origin: Arc<dyn Region>, prefix: &str) -> Self {
        Self {
            origin,
            prefix: prefix.to_string(),
        }
    }
}

impl fmt::Debug for Prefixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prefixed({:?}, \"{}\")", self.origin, self.prefix)
    }
}

#[async_trait]
impl Region for Prefixed {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        self.origin.aws().await
    }

    fn table(&self, name: &str) -> Arc<dyn Table> {
        Arc::new(AwsTable::new(
            Arc::new(OriginTransports(self.origin.clone())),
            Arc::new(self.clone()),
            &format!("{}{}", self.prefix, name),
        ))
    }
}

/// Credentials handing out a region's transports.
struct OriginTransports(Arc<dyn Region>);

#[async_trait]
impl Credentials for OriginTransports {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        self.0.aws().await
    }
}

impl fmt::Debug for OriginTransports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for OriginTransports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::attributes::Attributes;
    use crate::mock::MkData;

    #[tokio::test]
    async fn prefix_applies_to_table_names() {
        let data = MkData::new().with_table("test-users", &["id"]).unwrap();
        let region = Prefixed::new(data.region(), "test-");
        let table = region.table("users");
        assert_eq!(table.name(), "test-users");
        table.put(&Attributes::new().with("id", "a")).await.unwrap();
        assert_eq!(data.rows("test-users").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tables_keep_the_prefixed_region() {
        let data = MkData::new().with_table("test-users", &["id"]).unwrap();
        let region = Prefixed::new(data.region(), "test-");
        let table = region.table("users");
        assert_eq!(table.region().table("users").name(), "test-users");
        assert_eq!(table.frame().table().region().table("users").name(), "test-users");
        assert!(table.frame().is_empty().await.unwrap());
    }
}
