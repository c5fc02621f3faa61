use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::conditions::Conditions;
use crate::dynamo::dosage::Dosage;
use crate::error::{Error, Result};

/// Strategy that runs the first fetch of a frame and counts its records.
#[async_trait]
pub trait Valve: Send + Sync + fmt::Debug {
    /// Fetch the first page of `table` matching `conditions`.
    ///
    /// `keys` are the table's primary key names; they are always part of
    /// the projection so that fetched records can be deleted and updated.
    async fn fetch(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
        keys: &[String],
    ) -> Result<Box<dyn Dosage>>;

    /// Count all records of `table` matching `conditions`.
    async fn count(
        &self,
        credentials: Arc<dyn Credentials>,
        table: &str,
        conditions: &Conditions,
    ) -> Result<usize>;
}

/// Page size to send; the store rejects anything below 1.
pub(crate) fn page_limit(limit: usize) -> Result<usize> {
    if limit == 0 {
        return Err(Error::Config(
            "Page limit must be at least 1, got 0".to_string(),
        ));
    }
    Ok(limit)
}

/// Pre-fetch set plus primary keys, without duplicates.
pub(crate) fn projection(attributes: &[String], keys: &[String]) -> Vec<String> {
    attributes
        .iter()
        .chain(keys)
        .cloned()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect()
}
