use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::credentials::Credentials;
use crate::dynamo::conditions::{Condition, Conditions};
use crate::dynamo::iterator::{AwsIterator, Cursor};
use crate::dynamo::scanvalve::ScanValve;
use crate::dynamo::table::{AwsTable, Table};
use crate::dynamo::valve::Valve;
use crate::dynamo::value::AttributeValue;
use crate::error::Result;

/// Immutable, refinable view of a table's records.
///
/// Refining (`where_*`, `through`) returns a new frame and never changes the
/// receiver. Records are read through a [`Cursor`].
#[async_trait]
pub trait Frame: Send + Sync + fmt::Debug {
    /// Narrow to records whose `name` equals `value`.
    fn where_eq(&self, name: &str, value: AttributeValue) -> Arc<dyn Frame>;

    /// Narrow by an arbitrary predicate on `name`.
    fn where_condition(&self, name: &str, condition: Condition) -> Arc<dyn Frame>;

    /// Narrow by every predicate in `conditions`.
    fn where_all(&self, conditions: &Conditions) -> Arc<dyn Frame>;

    /// Same predicates, fetched through another valve.
    fn through(&self, valve: Arc<dyn Valve>) -> Arc<dyn Frame>;

    /// The table this frame selects from.
    fn table(&self) -> Arc<dyn Table>;

    /// A fresh cursor positioned before the first record.
    fn iterator(&self) -> Box<dyn Cursor>;

    /// Number of matching records, counted remotely.
    async fn size(&self) -> Result<usize>;

    /// True when not a single record matches.
    async fn is_empty(&self) -> Result<bool>;
}

/// Frame over one DynamoDB table.
#[derive(Clone)]
pub struct AwsFrame {
    pub(crate) credentials: Arc<dyn Credentials>,
    pub(crate) table: AwsTable,
    pub(crate) name: String,
    pub(crate) conditions: Conditions,
    pub(crate) valve: Arc<dyn Valve>,
}

impl AwsFrame {
    /// Whole table `name`, scanned with the default [`ScanValve`].
    pub fn new(credentials: Arc<dyn Credentials>, table: AwsTable, name: &str) -> Self {
        Self {
            credentials,
            table,
            name: name.to_string(),
            conditions: Conditions::new(),
            valve: Arc::new(ScanValve::default()),
        }
    }

    /// Predicates of this frame.
    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    fn with_conditions(&self, conditions: Conditions) -> Arc<dyn Frame> {
        Arc::new(Self {
            conditions,
            ..self.clone()
        })
    }
}

impl fmt::Debug for AwsFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsFrame")
            .field("table", &self.name)
            .field("conditions", &self.conditions.to_string())
            .field("valve", &self.valve)
            .finish()
    }
}

#[async_trait]
impl Frame for AwsFrame {
    fn where_eq(&self, name: &str, value: AttributeValue) -> Arc<dyn Frame> {
        self.where_condition(name, Condition::equal_to(value))
    }

    fn where_condition(&self, name: &str, condition: Condition) -> Arc<dyn Frame> {
        self.with_conditions(self.conditions.with(name, condition))
    }

    fn where_all(&self, conditions: &Conditions) -> Arc<dyn Frame> {
        self.with_conditions(self.conditions.with_all(conditions))
    }

    fn through(&self, valve: Arc<dyn Valve>) -> Arc<dyn Frame> {
        Arc::new(Self {
            valve,
            ..self.clone()
        })
    }

    fn table(&self) -> Arc<dyn Table> {
        Arc::new(self.table.clone())
    }

    fn iterator(&self) -> Box<dyn Cursor> {
        Box::new(AwsIterator::new(self.clone()))
    }

    async fn size(&self) -> Result<usize> {
        self.valve
            .count(self.credentials.clone(), &self.name, &self.conditions)
            .await
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(!self.iterator().has_next().await?)
    }
}
