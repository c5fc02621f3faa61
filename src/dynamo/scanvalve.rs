use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::conditions::Conditions;
use crate::dynamo::dosage::{Dosage, RemoteDosage};
use crate::dynamo::request::{PageRequest, Select};
use crate::dynamo::valve::{Valve, page_limit, projection};
use crate::error::Result;

const DEFAULT_LIMIT: usize = 100;

/// Valve that scans the whole table and filters on the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanValve {
    limit: usize,
    attributes: Vec<String>,
}

impl Default for ScanValve {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            attributes: Vec::new(),
        }
    }
}

impl ScanValve {
    /// Valve reading 100 records per page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records evaluated per page, before filtering.
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    /// Pre-fetch one more attribute with every record.
    pub fn with_attribute_to_get(&self, name: &str) -> Self {
        let mut attributes = self.attributes.clone();
        attributes.push(name.to_string());
        Self {
            attributes,
            ..self.clone()
        }
    }

    /// Pre-fetch these attributes too.
    pub fn with_attributes_to_get<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut attributes = self.attributes.clone();
        attributes.extend(names.iter().map(|name| name.as_ref().to_string()));
        Self {
            attributes,
            ..self.clone()
        }
    }
}

#[async_trait]
impl Valve for ScanValve {
    async fn fetch(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
        keys: &[String],
    ) -> Result<Box<dyn Dosage>> {
        let request = PageRequest::scan(table)
            .with_conditions(conditions.clone())
            .with_limit(page_limit(self.limit)?)
            .with_attributes_to_get(projection(&self.attributes, keys))
            .with_select(Select::SpecificAttributes);
        let aws = credentials.aws().await?;
        let start = Instant::now();
        let page = aws.fetch_page(&request).await.map_err(|e| {
            e.context(format!(
                "Failed to fetch from \"{table}\" by {conditions} and {keys:?}"
            ))
        })?;
        log::info!(
            "#items(): loaded {} item(s) from '{}' and stopped at {}, using {}, {}, in {}ms",
            page.items.len(),
            table,
            page.last_evaluated_key
                .as_ref()
                .map_or_else(|| "the end".to_string(), ToString::to_string),
            conditions,
            page.capacity,
            start.elapsed().as_millis()
        );
        Ok(Box::new(RemoteDosage::new(credentials, request, page)))
    }

    async fn count(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
    ) -> Result<usize> {
        let mut request = PageRequest::scan(table)
            .with_conditions(conditions.clone())
            .with_select(Select::Count);
        let aws = credentials.aws().await?;
        let start = Instant::now();
        let mut total = 0usize;

        loop {
            let page = aws.fetch_page(&request).await.map_err(|e| {
                e.context(format!("Failed to count \"{table}\" by {conditions}"))
            })?;
            total += page.count;
            match page.last_evaluated_key {
                Some(key) => request = request.with_exclusive_start_key(key),
                None => break,
            }
        }

        log::info!(
            "#total(): COUNT={} in '{}' using {}, in {}ms",
            total,
            table,
            conditions,
            start.elapsed().as_millis()
        );
        Ok(total)
    }
}
