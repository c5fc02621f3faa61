use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::attributes::Attributes;
use crate::dynamo::request::PageRequest;
use crate::dynamo::transport::Page;
use crate::error::{Error, Result};

/// One fetched page of records, able to fetch the page after it.
#[async_trait]
pub trait Dosage: Send + Sync {
    /// Records of this page, in the order the store returned them.
    fn items(&self) -> &[Attributes];

    /// True when the store has more records after this page.
    fn has_next(&self) -> bool;

    /// Fetch the following page.
    async fn next(&self) -> Result<Box<dyn Dosage>>;
}

/// A page with nothing in it and nothing after it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDosage;

#[async_trait]
impl Dosage for EmptyDosage {
    fn items(&self) -> &[Attributes] {
        &[]
    }

    fn has_next(&self) -> bool {
        false
    }

    async fn next(&self) -> Result<Box<dyn Dosage>> {
        Err(Error::IllegalState("this is nothing left".to_string()))
    }
}

/// A page returned by the store together with the request that produced it.
pub struct RemoteDosage {
    credentials: Arc<dyn Credentials>,
    request: PageRequest,
    page: Page,
}

impl RemoteDosage {
    /// Page returned for `request`; the next one is fetched with `credentials`.
    pub fn new(credentials: Arc<dyn Credentials>, request: PageRequest, page: Page) -> Self {
        Self {
            credentials,
            request,
            page,
        }
    }

    /// The page as the store returned it.
    pub fn page(&self) -> &Page {
        &self.page
    }
}

#[async_trait]
impl Dosage for RemoteDosage {
    fn items(&self) -> &[Attributes] {
        &self.page.items
    }

    fn has_next(&self) -> bool {
        self.page.last_evaluated_key.is_some()
    }

    async fn next(&self) -> Result<Box<dyn Dosage>> {
        let Some(key) = self.page.last_evaluated_key.clone() else {
            return Err(Error::IllegalState(
                "Nothing left in the iterator".to_string(),
            ));
        };
        let request = self.request.clone().with_exclusive_start_key(key);
        let aws = self.credentials.aws().await?;
        let start = std::time::Instant::now();
        let page = aws.fetch_page(&request).await.map_err(|e| {
            e.context(format!("Failed to fetch next page of {}", self.request))
        })?;
        log::info!(
            "#next(): loaded {} item(s) from '{}' and stopped at {}, {}, in {}ms",
            page.items.len(),
            request.table,
            page.last_evaluated_key
                .as_ref()
                .map_or_else(|| "the end".to_string(), ToString::to_string),
            page.capacity,
            start.elapsed().as_millis()
        );
        Ok(Box::new(RemoteDosage::new(
            self.credentials.clone(),
            self.request.clone(),
            page,
        )))
    }
}
