//! In-memory DynamoDB stand-in for tests.
//!
//! [`MkData`] is both the credentials and the transport: every handle it
//! hands out shares one store. Query and scan honor the page limit and
//! continuation keys the way DynamoDB does, but only understand `EQ`, `GT`
//! and `LT` predicates with a single value.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::auth::credentials::Credentials;
use crate::dynamo::attributes::{AttributeAction, AttributeUpdates, Attributes};
use crate::dynamo::conditions::{ComparisonOperator, Conditions};
use crate::dynamo::region::{Region, Simple};
use crate::dynamo::request::{Operation, PageRequest, Select};
use crate::dynamo::transport::{Capacity, Page, Reply, Transport};
use crate::dynamo::value::AttributeValue;
use crate::error::{Error, Result};

/// Ordered form of one key attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    N(Decimal),
    S(String),
    B(Vec<u8>),
}

type RowKey = Vec<KeyPart>;

#[derive(Debug, Default)]
struct MkTable {
    keys: Vec<String>,
    rows: BTreeMap<RowKey, Attributes>,
}

impl MkTable {
    fn key_of(&self, item: &Attributes) -> Result<RowKey> {
        self.keys
            .iter()
            .map(|name| {
                let value = item.get(name).ok_or_else(|| {
                    Error::transport(format!(
                        "ValidationException: One of the required keys was not given a value: {name}"
                    ))
                })?;
                key_part(name, value)
            })
            .collect()
    }

    fn check_expected(&self, key: &RowKey, expected: Option<&Attributes>) -> Result<()> {
        let Some(expected) = expected.filter(|e| !e.is_empty()) else {
            return Ok(());
        };
        let holds = self.rows.get(key).is_some_and(|row| {
            expected
                .iter()
                .all(|(name, value)| row.get(name).is_some_and(|v| same(v, value)))
        });
        if holds {
            Ok(())
        } else {
            Err(Error::transport(
                "ConditionalCheckFailedException: The conditional request failed",
            ))
        }
    }
}

fn key_part(name: &str, value: &AttributeValue) -> Result<KeyPart> {
    match value {
        AttributeValue::S(text) => Ok(KeyPart::S(text.clone())),
        AttributeValue::B(bytes) => Ok(KeyPart::B(bytes.clone())),
        AttributeValue::N(text) => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map(KeyPart::N)
            .map_err(|e| Error::transport(format!("ValidationException: bad number in {name}: {e}"))),
        other => Err(Error::transport(format!(
            "ValidationException: key {name} must be S, N or B, not {other}"
        ))),
    }
}

fn same(left: &AttributeValue, right: &AttributeValue) -> bool {
    left == right || left.compare(right) == Some(Ordering::Equal)
}

fn validate(conditions: &Conditions) -> Result<()> {
    for (name, condition) in conditions.iter() {
        if !matches!(
            condition.operator,
            ComparisonOperator::Eq | ComparisonOperator::Gt | ComparisonOperator::Lt
        ) {
            return Err(Error::UnsupportedPredicate(format!(
                "{} on \"{name}\", only EQ, GT and LT are supported",
                condition.operator
            )));
        }
        if condition.values.len() != 1 {
            return Err(Error::UnsupportedPredicate(format!(
                "{} on \"{name}\" needs exactly one value, got {}",
                condition.operator,
                condition.values.len()
            )));
        }
    }
    Ok(())
}

fn matches(item: &Attributes, conditions: &Conditions) -> bool {
    conditions.iter().all(|(name, condition)| {
        let (Some(actual), Some(expected)) = (item.get(name), condition.values.first()) else {
            return false;
        };
        match condition.operator {
            ComparisonOperator::Eq => same(actual, expected),
            ComparisonOperator::Gt => actual.compare(expected) == Some(Ordering::Greater),
            ComparisonOperator::Lt => actual.compare(expected) == Some(Ordering::Less),
            _ => false,
        }
    })
}

fn add(current: Option<&AttributeValue>, delta: &AttributeValue) -> Result<AttributeValue> {
    match (current, delta) {
        (None, value) => Ok(value.clone()),
        (Some(AttributeValue::N(_)), AttributeValue::N(_)) => {
            let sum = current
                .and_then(AttributeValue::as_decimal)
                .zip(delta.as_decimal())
                .map(|(left, right)| left + right)
                .ok_or_else(|| Error::transport("ValidationException: invalid number for ADD"))?;
            Ok(AttributeValue::from(sum))
        }
        (Some(AttributeValue::Ss(left)), AttributeValue::Ss(right)) => {
            let mut merged = left.clone();
            merged.extend(right.iter().filter(|v| !left.contains(v)).cloned());
            Ok(AttributeValue::Ss(merged))
        }
        (Some(AttributeValue::Ns(left)), AttributeValue::Ns(right)) => {
            let mut merged = left.clone();
            merged.extend(right.iter().filter(|v| !left.contains(v)).cloned());
            Ok(AttributeValue::Ns(merged))
        }
        (Some(existing), value) => Err(Error::transport(format!(
            "ValidationException: can't ADD {value} to {existing}"
        ))),
    }
}

/// In-memory tables shared by every clone.
#[derive(Clone, Default)]
pub struct MkData {
    tables: Arc<Mutex<HashMap<String, MkTable>>>,
}

impl MkData {
    /// Store without tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table with these key names, hash key first.
    pub fn with_table(self, name: &str, keys: &[&str]) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::Config(format!("Table \"{name}\" needs at least one key")));
        }
        {
            let mut tables = self
                .tables
                .try_lock()
                .map_err(|_| Error::IllegalState("The store is in use".to_string()))?;
            tables.insert(
                name.to_string(),
                MkTable {
                    keys: keys.iter().map(|k| k.to_string()).collect(),
                    rows: BTreeMap::new(),
                },
            );
        }
        Ok(self)
    }

    /// Region over this store.
    pub fn region(&self) -> Arc<dyn Region> {
        Arc::new(Simple::new(self.clone()))
    }

    /// Store a record directly.
    pub async fn insert(&self, table: &str, item: Attributes) -> Result<()> {
        self.put_item(table, &item).await.map(|_| ())
    }

    /// Every record of a table, in key order.
    pub async fn rows(&self, table: &str) -> Result<Vec<Attributes>> {
        let tables = self.tables.lock().await;
        let table = lookup(&tables, table)?;
        Ok(table.rows.values().cloned().collect())
    }
}

fn lookup<'a>(tables: &'a HashMap<String, MkTable>, name: &str) -> Result<&'a MkTable> {
    tables.get(name).ok_or_else(|| not_found(name))
}

fn lookup_mut<'a>(tables: &'a mut HashMap<String, MkTable>, name: &str) -> Result<&'a mut MkTable> {
    tables.get_mut(name).ok_or_else(|| not_found(name))
}

fn not_found(name: &str) -> Error {
    Error::transport(format!(
        "ResourceNotFoundException: Requested resource not found: Table: {name} not found"
    ))
}

impl fmt::Debug for MkData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for MkData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("in-memory")
    }
}

#[async_trait]
impl Credentials for MkData {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl Transport for MkData {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        validate(&request.conditions)?;
        if request.limit == Some(0) {
            return Err(Error::transport(
                "ValidationException: Value '0' at 'limit' failed to satisfy constraint: \
                 Member must have value greater than or equal to 1",
            ));
        }
        let tables = self.tables.lock().await;
        let table = lookup(&tables, &request.table)?;
        if let Some(index) = &request.index {
            log::debug!("index \"{index}\" is ignored by the in-memory store");
        }

        let after = request
            .exclusive_start_key
            .as_ref()
            .map(|key| table.key_of(key))
            .transpose()?;
        let rows: Box<dyn Iterator<Item = (&RowKey, &Attributes)> + '_> =
            match (&after, request.operation, request.forward) {
                (Some(key), Operation::Query, false) => {
                    Box::new(table.rows.range::<RowKey, _>((Bound::Unbounded, Bound::Excluded(key))).rev())
                }
                (None, Operation::Query, false) => Box::new(table.rows.iter().rev()),
                (Some(key), _, _) => {
                    Box::new(table.rows.range::<RowKey, _>((Bound::Excluded(key), Bound::Unbounded)))
                }
                (None, _, _) => Box::new(table.rows.iter()),
            };

        let limit = request.limit.unwrap_or(usize::MAX);
        let mut evaluated = 0usize;
        let mut last = None;
        let mut found = Vec::new();
        for (_, row) in rows {
            if evaluated == limit {
                break;
            }
            let hit = matches(row, &request.conditions);
            // A scan's limit counts rows read before filtering, a query's
            // counts matching rows.
            if hit || request.operation == Operation::Scan {
                evaluated += 1;
                last = Some(row);
            }
            if hit {
                found.push(row);
            }
        }

        let last_evaluated_key = if evaluated == limit {
            last.map(|row| row.only(&table.keys))
        } else {
            None
        };
        let count = found.len();
        let items = match request.select {
            Some(Select::Count) => Vec::new(),
            _ if request.attributes_to_get.is_empty() => found.into_iter().cloned().collect(),
            _ => found
                .into_iter()
                .map(|row| row.only(&request.attributes_to_get))
                .collect(),
        };

        Ok(Page {
            items,
            last_evaluated_key,
            count,
            capacity: Capacity::unknown(),
        })
    }

    async fn get_item(
        &self,
        table: &str,
        key: &Attributes,
        attributes: &[String],
        _consistent: bool,
    ) -> Result<Reply<Option<Attributes>>> {
        let tables = self.tables.lock().await;
        let table = lookup(&tables, table)?;
        let row = table.rows.get(&table.key_of(key)?).map(|row| {
            if attributes.is_empty() {
                row.clone()
            } else {
                row.only(attributes)
            }
        });
        Ok(Reply::new(row, Capacity::unknown()))
    }

    async fn put_item(&self, table: &str, item: &Attributes) -> Result<Reply<()>> {
        let mut tables = self.tables.lock().await;
        let table = lookup_mut(&mut tables, table)?;
        let key = table.key_of(item)?;
        table.rows.insert(key, item.clone());
        Ok(Reply::new((), Capacity::unknown()))
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Attributes,
        updates: &AttributeUpdates,
        expected: Option<&Attributes>,
    ) -> Result<Reply<Attributes>> {
        let mut tables = self.tables.lock().await;
        let table = lookup_mut(&mut tables, table)?;
        let row_key = table.key_of(key)?;
        table.check_expected(&row_key, expected)?;

        let mut row: BTreeMap<String, AttributeValue> = match table.rows.get(&row_key) {
            Some(existing) => existing.iter().map(|(n, v)| (n.clone(), v.clone())).collect(),
            None => key
                .only(&table.keys)
                .iter()
                .map(|(n, v)| (n.clone(), v.clone()))
                .collect(),
        };

        for (name, update) in updates.iter() {
            if table.keys.contains(name) {
                return Err(Error::transport(format!(
                    "ValidationException: Cannot update attribute {name}. This attribute is part of the key"
                )));
            }
            match (update.action, &update.value) {
                (AttributeAction::Put, Some(value)) => {
                    row.insert(name.clone(), value.clone());
                }
                (AttributeAction::Add, Some(value)) => {
                    let sum = add(row.get(name), value)?;
                    row.insert(name.clone(), sum);
                }
                (AttributeAction::Delete, _) => {
                    row.remove(name);
                }
                (action, None) => {
                    return Err(Error::transport(format!(
                        "ValidationException: {action:?} of {name} needs a value"
                    )));
                }
            }
        }

        let row = Attributes::from(row);
        let names: Vec<&str> = updates.iter().map(|(name, _)| name.as_str()).collect();
        let updated = row.only(&names);
        table.rows.insert(row_key, row);
        Ok(Reply::new(updated, Capacity::unknown()))
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &Attributes,
        expected: Option<&Attributes>,
    ) -> Result<Reply<()>> {
        let mut tables = self.tables.lock().await;
        let table = lookup_mut(&mut tables, table)?;
        let row_key = table.key_of(key)?;
        table.check_expected(&row_key, expected)?;
        table.rows.remove(&row_key);
        Ok(Reply::new((), Capacity::unknown()))
    }

    async fn describe_keys(&self, table: &str) -> Result<Vec<String>> {
        let tables = self.tables.lock().await;
        Ok(lookup(&tables, table)?.keys.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::attributes::AttributeValueUpdate;
    use crate::dynamo::conditions::Condition;

    async fn numbers() -> MkData {
        let data = MkData::new().with_table("n", &["id", "at"]).unwrap();
        for at in [10, 9, 2, 1] {
            data.insert("n", Attributes::new().with("id", "x").with("at", at))
                .await
                .unwrap();
        }
        data
    }

    fn ats(page: &Page) -> Vec<String> {
        page.items
            .iter()
            .map(|item| item.get("at").and_then(|v| v.as_n()).unwrap().to_string())
            .collect()
    }

    #[test]
    fn table_needs_keys() {
        assert!(matches!(
            MkData::new().with_table("t", &[]),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn numeric_keys_sort_numerically() {
        let data = numbers().await;
        let page = data
            .fetch_page(&PageRequest::query("n").with_conditions(Conditions::new().with_eq("id", "x")))
            .await
            .unwrap();
        assert_eq!(ats(&page), vec!["1", "2", "9", "10"]);
        assert!(page.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn descending_query_pages_backwards() {
        let data = numbers().await;
        let request = PageRequest::query("n")
            .with_conditions(Conditions::new().with_eq("id", "x"))
            .with_forward(false)
            .with_limit(3);
        let first = data.fetch_page(&request).await.unwrap();
        assert_eq!(ats(&first), vec!["10", "9", "2"]);
        let key = first.last_evaluated_key.unwrap();
        let second = data
            .fetch_page(&request.with_exclusive_start_key(key))
            .await
            .unwrap();
        assert_eq!(ats(&second), vec!["1"]);
        assert!(second.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn rejects_unsupported_predicates() {
        let data = numbers().await;
        let between = Conditions::new().with(
            "at",
            Condition::new(
                ComparisonOperator::Between,
                vec![AttributeValue::from(1), AttributeValue::from(5)],
            ),
        );
        let error = data
            .fetch_page(&PageRequest::scan("n").with_conditions(between))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::UnsupportedPredicate(_)));
        assert!(!error.is_retryable());
    }

    #[tokio::test]
    async fn zero_limit_is_a_validation_error() {
        let data = numbers().await;
        let error = data
            .fetch_page(&PageRequest::scan("n").with_limit(0))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("ValidationException"), "{error}");
        assert!(error.is_retryable());
    }

    #[tokio::test]
    async fn count_returns_no_items() {
        let data = numbers().await;
        let page = data
            .fetch_page(
                &PageRequest::scan("n")
                    .with_conditions(Conditions::new().with("at", Condition::less_than(5)))
                    .with_select(Select::Count),
            )
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn conditional_writes_check_expected_values() {
        let data = numbers().await;
        let key = Attributes::new().with("id", "x").with("at", 1);
        let missing = Attributes::new().with("id", "x").with("at", 3);

        let error = data.delete_item("n", &missing, Some(&missing)).await.unwrap_err();
        assert!(error.to_string().contains("ConditionalCheckFailedException"));

        let updated = data
            .update_item(
                "n",
                &key,
                &AttributeUpdates::new()
                    .with_value("name", "one")
                    .with("hits", AttributeValueUpdate::add(5)),
                Some(&key),
            )
            .await
            .unwrap()
            .value;
        assert_eq!(updated.get("hits"), Some(&AttributeValue::from(5)));
        assert_eq!(updated.get("name"), Some(&AttributeValue::from("one")));

        data.delete_item("n", &key, Some(&key)).await.unwrap();
        assert_eq!(data.rows("n").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn keys_are_required_and_immutable() {
        let data = numbers().await;
        assert!(data.insert("n", Attributes::new().with("id", "x")).await.is_err());
        let key = Attributes::new().with("id", "x").with("at", 1);
        let error = data
            .update_item("n", &key, &AttributeUpdates::new().with_value("at", 2), None)
            .await
            .unwrap_err();
        assert!(error.is_retryable());
        assert_eq!(data.describe_keys("n").await.unwrap(), vec!["id", "at"]);
        assert!(data.describe_keys("missing").await.is_err());
    }
}
