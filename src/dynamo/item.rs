use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::credentials::Credentials;
use crate::dynamo::attributes::{AttributeUpdates, AttributeValueUpdate, Attributes};
use crate::dynamo::frame::{AwsFrame, Frame};
use crate::dynamo::value::AttributeValue;
use crate::error::{Error, Result};

/// One record of a table, bound to the frame it was read from.
///
/// Attributes fetched with the page are served locally; anything else is
/// read from the store on demand. Writes go straight to the store and are
/// not reflected in [`Item::attributes`], so an item is stale after `put`.
#[derive(Clone)]
pub struct Item {
    credentials: Arc<dyn Credentials>,
    frame: AwsFrame,
    table: String,
    attributes: Attributes,
    keys: Vec<String>,
}

impl Item {
    pub(crate) fn new(
        credentials: Arc<dyn Credentials>,
        frame: AwsFrame,
        table: &str,
        attributes: Attributes,
        keys: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            frame,
            table: table.to_string(),
            attributes,
            keys,
        }
    }

    /// Value of `name`, loaded with a consistent read when it was not
    /// pre-fetched.
    pub async fn get(&self, name: &str) -> Result<AttributeValue> {
        if let Some(value) = self.attributes.get(name) {
            return Ok(value.clone());
        }
        let start = Instant::now();
        let value = self.load(name).await.map_err(|e| {
            e.context(format!(
                "Failed to get \"{name}\" from \"{}\" by {:?}",
                self.table, self.keys
            ))
        })?;
        log::info!(
            "#get('{}'): loaded '{}' from DynamoDB, in {}ms",
            name,
            value.as_ref().map_or_else(|| "nothing".to_string(), ToString::to_string),
            start.elapsed().as_millis()
        );
        value.ok_or_else(|| Error::MissingAttribute(format!("attribute \"{name}\" not found")))
    }

    /// True when the record has `name`, checked remotely when it was not
    /// pre-fetched.
    pub async fn has(&self, name: &str) -> Result<bool> {
        if self.attributes.contains_key(name) {
            return Ok(true);
        }
        let start = Instant::now();
        let has = self
            .load(name)
            .await
            .map_err(|e| {
                e.context(format!(
                    "Failed to check existence of \"{name}\" at \"{}\" by {:?}",
                    self.table, self.keys
                ))
            })?
            .is_some();
        log::info!(
            "#has('{}'): {} from DynamoDB, in {}ms",
            name,
            has,
            start.elapsed().as_millis()
        );
        Ok(has)
    }

    /// Change one attribute. Returns the updated attributes.
    pub async fn put(&self, name: &str, update: AttributeValueUpdate) -> Result<Attributes> {
        self.put_all(&AttributeUpdates::new().with(name, update)).await
    }

    /// Change several attributes at once, provided the record still exists.
    /// Returns the updated attributes with their new values.
    pub async fn put_all(&self, updates: &AttributeUpdates) -> Result<Attributes> {
        let key = self.attributes.only(&self.keys);
        let aws = self.credentials.aws().await?;
        let start = Instant::now();
        let reply = aws
            .update_item(&self.table, &key, updates, Some(&key))
            .await
            .map_err(|e| {
                e.context(format!(
                    "Failed to put {:?} into \"{}\" with {:?}",
                    updates.iter().map(|(name, _)| name).collect::<Vec<_>>(),
                    self.table,
                    self.keys
                ))
            })?;
        log::info!(
            "#put(): updated {} attribute(s) of an item in '{}', {}, in {}ms",
            updates.len(),
            self.table,
            reply.capacity,
            start.elapsed().as_millis()
        );
        Ok(reply.value)
    }

    /// The frame this item belongs to.
    pub fn frame(&self) -> Arc<dyn Frame> {
        Arc::new(self.frame.clone())
    }

    /// Attributes loaded together with the item.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Primary key names of the table.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    async fn load(&self, name: &str) -> Result<Option<AttributeValue>> {
        let aws = self.credentials.aws().await?;
        let reply = aws
            .get_item(
                &self.table,
                &self.attributes.only(&self.keys),
                &[name.to_string()],
                true,
            )
            .await?;
        Ok(reply.value.and_then(|item| item.get(name).cloned()))
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("table", &self.table)
            .field("attributes", &self.attributes)
            .field("keys", &self.keys)
            .finish()
    }
}
