use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::auth::credentials::Credentials;
use crate::dynamo::attributes::Attributes;
use crate::dynamo::frame::{AwsFrame, Frame};
use crate::dynamo::item::Item;
use crate::dynamo::region::Region;
use crate::error::Result;

/// A named table of a region.
#[async_trait]
pub trait Table: Send + Sync + fmt::Debug {
    /// Create or replace a record. The returned item holds only its keys.
    async fn put(&self, attributes: &Attributes) -> Result<Item>;

    /// Frame over all records, read through a scan.
    fn frame(&self) -> Arc<dyn Frame>;

    /// The region this table belongs to.
    fn region(&self) -> Arc<dyn Region>;

    /// Full table name.
    fn name(&self) -> &str;

    /// Delete the record with these key attributes.
    async fn delete(&self, keys: &Attributes) -> Result<()>;
}

/// Table reached through credentials.
#[derive(Clone)]
pub struct AwsTable {
    credentials: Arc<dyn Credentials>,
    region: Arc<dyn Region>,
    name: String,
    keys: Arc<OnceCell<Vec<String>>>,
}

impl AwsTable {
    /// Handle of table `name` in `region`.
    pub fn new(credentials: Arc<dyn Credentials>, region: Arc<dyn Region>, name: &str) -> Self {
        Self {
            credentials,
            region,
            name: name.to_string(),
            keys: Arc::new(OnceCell::new()),
        }
    }

    /// Primary key names, described once and then cached for this handle.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let keys = self
            .keys
            .get_or_try_init(|| async {
                let aws = self.credentials.aws().await?;
                let start = Instant::now();
                let keys = aws
                    .describe_keys(&self.name)
                    .await
                    .map_err(|e| e.context(format!("Failed to describe \"{}\"", self.name)))?;
                log::info!(
                    "#keys(): table {} described, in {}ms",
                    self.name,
                    start.elapsed().as_millis()
                );
                Ok::<_, crate::error::Error>(keys)
            })
            .await?;
        Ok(keys.clone())
    }

    /// Frame over this table with its concrete type.
    pub fn aws_frame(&self) -> AwsFrame {
        AwsFrame::new(self.credentials.clone(), self.clone(), &self.name)
    }
}

impl fmt::Debug for AwsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsTable")
            .field("name", &self.name)
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[async_trait]
impl Table for AwsTable {
    async fn put(&self, attributes: &Attributes) -> Result<Item> {
        let aws = self.credentials.aws().await?;
        let start = Instant::now();
        let reply = aws.put_item(&self.name, attributes).await.map_err(|e| {
            e.context(format!(
                "Failed to put into \"{}\" with {}",
                self.name, attributes
            ))
        })?;
        log::info!(
            "#put('{}'): created item in '{}', {}, in {}ms",
            attributes,
            self.name,
            reply.capacity,
            start.elapsed().as_millis()
        );
        let keys = self.keys().await?;
        Ok(Item::new(
            self.credentials.clone(),
            self.aws_frame(),
            &self.name,
            attributes.only(&keys),
            keys,
        ))
    }

    fn frame(&self) -> Arc<dyn Frame> {
        Arc::new(self.aws_frame())
    }

    fn region(&self) -> Arc<dyn Region> {
        self.region.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn delete(&self, keys: &Attributes) -> Result<()> {
        let aws = self.credentials.aws().await?;
        let start = Instant::now();
        let reply = aws.delete_item(&self.name, keys, None).await.map_err(|e| {
            e.context(format!(
                "Failed to delete at \"{}\" by keys {}",
                self.name, keys
            ))
        })?;
        log::info!(
            "#delete('{}'): deleted item in '{}', {}, in {}ms",
            keys,
            self.name,
            reply.capacity,
            start.elapsed().as_millis()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mock::MkData;

    #[tokio::test]
    async fn put_keeps_only_keys() {
        let data = MkData::new().with_table("events", &["id", "at"]).unwrap();
        let table = data.region().table("events");
        let item = table
            .put(&Attributes::new().with("id", "x").with("at", 1).with("body", "hi"))
            .await
            .unwrap();
        assert_eq!(item.attributes().names().collect::<Vec<_>>(), vec!["at", "id"]);
        assert_eq!(item.keys(), ["id".to_string(), "at".to_string()]);
        assert_eq!(table.frame().size().await.unwrap(), 1);

        table
            .delete(&Attributes::new().with("id", "x").with("at", 1))
            .await
            .unwrap();
        assert!(table.frame().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn unknown_table_fails_as_transport() {
        let data = MkData::new();
        let table = data.region().table("nowhere");
        let error = table.put(&Attributes::new().with("id", "x")).await.unwrap_err();
        assert!(matches!(error, Error::Transport(_)));
        assert!(error.to_string().contains("Failed to put into \"nowhere\""));
    }
}
