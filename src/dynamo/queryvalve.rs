use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::conditions::Conditions;
use crate::dynamo::dosage::{Dosage, RemoteDosage};
use crate::dynamo::request::{PageRequest, Select};
use crate::dynamo::valve::{Valve, page_limit, projection};
use crate::error::Result;

const DEFAULT_LIMIT: usize = 20;

/// Valve that runs key-condition queries.
///
/// Frame predicates become key conditions, so they must name the hash key
/// (and optionally the range key) of the table or of `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryValve {
    limit: usize,
    forward: bool,
    attributes: Vec<String>,
    index: Option<String>,
    select: Select,
    consistent: bool,
}

impl Default for QueryValve {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            forward: true,
            attributes: Vec::new(),
            index: None,
            select: Select::SpecificAttributes,
            consistent: true,
        }
    }
}

impl QueryValve {
    /// Valve with default settings: 20 records per page, ascending, consistent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page size.
    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    /// Ascending (`true`) or descending range key order.
    pub fn with_scan_index_forward(&self, forward: bool) -> Self {
        Self {
            forward,
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

    /// Query a secondary index instead of the table.
    pub fn with_index_name(&self, index: &str) -> Self {
        Self {
            index: Some(index.to_string()),
            ..self.clone()
        }
    }

    /// What each record carries; only `SpecificAttributes` sends a projection.
    pub fn with_select(&self, select: Select) -> Self {
        Self {
            select,
            ..self.clone()
        }
    }

    /// Strongly consistent (`true`) or eventually consistent reads.
    pub fn with_consistent_read(&self, consistent: bool) -> Self {
        Self {
            consistent,
            ..self.clone()
        }
    }

    fn request(&self, table: &str, conditions: &Conditions, keys: &[String]) -> Result<PageRequest> {
        let request = PageRequest::query(table)
            .with_conditions(conditions.clone())
            .with_limit(page_limit(self.limit)?)
            .with_forward(self.forward)
            .with_index(self.index.clone())
            .with_select(self.select)
            .with_consistent_read(self.consistent);
        if self.select == Select::SpecificAttributes {
            Ok(request.with_attributes_to_get(projection(&self.attributes, keys)))
        } else {
            Ok(request)
        }
    }
}

#[async_trait]
impl Valve for QueryValve {
    async fn fetch(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
        keys: &[String],
    ) -> Result<Box<dyn Dosage>> {
        let request = self.request(table, conditions, keys)?;
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
        let mut request = PageRequest::query(table)
            .with_conditions(conditions.clone())
            .with_index(self.index.clone())
            .with_select(Select::Count)
            .with_consistent_read(self.consistent);
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
