use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::dynamo::value::AttributeValue;

/// Comparison operators understood by key conditions and scan filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
    NotNull,
    Null,
    Contains,
    NotContains,
    BeginsWith,
    In,
    Between,
}

impl ComparisonOperator {
    /// Name of the operator on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "EQ",
            ComparisonOperator::Ne => "NE",
            ComparisonOperator::Le => "LE",
            ComparisonOperator::Lt => "LT",
            ComparisonOperator::Ge => "GE",
            ComparisonOperator::Gt => "GT",
            ComparisonOperator::NotNull => "NOT_NULL",
            ComparisonOperator::Null => "NULL",
            ComparisonOperator::Contains => "CONTAINS",
            ComparisonOperator::NotContains => "NOT_CONTAINS",
            ComparisonOperator::BeginsWith => "BEGINS_WITH",
            ComparisonOperator::In => "IN",
            ComparisonOperator::Between => "BETWEEN",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate on one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Condition {
    #[serde(rename = "ComparisonOperator")]
    pub operator: ComparisonOperator,
    #[serde(rename = "AttributeValueList", skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AttributeValue>,
}

impl Condition {
    /// Predicate comparing against `values`.
    pub fn new(operator: ComparisonOperator, values: Vec<AttributeValue>) -> Self {
        Self { operator, values }
    }

    /// Equality predicate on a scalar.
    pub fn equal_to(value: impl Into<AttributeValue>) -> Self {
        Self::new(ComparisonOperator::Eq, vec![value.into()])
    }

    /// `GT value`.
    pub fn greater_than(value: impl Into<AttributeValue>) -> Self {
        Self::new(ComparisonOperator::Gt, vec![value.into()])
    }

    /// `LT value`.
    pub fn less_than(value: impl Into<AttributeValue>) -> Self {
        Self::new(ComparisonOperator::Lt, vec![value.into()])
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.operator)?;
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}

/// Immutable map of attribute names to predicates.
///
/// Merging replaces predicates on the same name and keeps the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(Arc<BTreeMap<String, Condition>>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy with one predicate added or replaced.
    pub fn with(&self, name: impl Into<String>, condition: Condition) -> Self {
        let mut map = (*self.0).clone();
        map.insert(name.into(), condition);
        Self(Arc::new(map))
    }

    /// Copy with an equality predicate for `name`.
    pub fn with_eq(&self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(name, Condition::equal_to(value))
    }

    /// Copy with every predicate of `other` added or replaced.
    pub fn with_all(&self, other: &Conditions) -> Self {
        let mut map = (*self.0).clone();
        map.extend(other.iter().map(|(name, condition)| (name.clone(), condition.clone())));
        Self(Arc::new(map))
    }

    /// Predicate on `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Condition> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Predicates in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Condition> {
        self.0.iter()
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no conditions");
        }
        for (index, (name, condition)) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{name} {condition}")?;
        }
        Ok(())
    }
}

impl Serialize for Conditions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merging_overwrites_same_name_and_keeps_others() {
        let first = Conditions::new().with_eq("id", "a").with_eq("kind", "x");
        let second = first.with_all(&Conditions::new().with_eq("kind", "y"));
        assert_eq!(first.get("kind"), Some(&Condition::equal_to("x")));
        assert_eq!(second.get("kind"), Some(&Condition::equal_to("y")));
        assert_eq!(second.get("id"), Some(&Condition::equal_to("a")));
    }

    #[test]
    fn renders_readable_predicates() {
        let conditions = Conditions::new()
            .with_eq("id", "a")
            .with("n", Condition::greater_than(5));
        assert_eq!(conditions.to_string(), "id EQ [{S: a}] AND n GT [{N: 5}]");
    }

    #[test]
    fn serializes_legacy_condition_shape() {
        let conditions = Conditions::new()
            .with_eq("id", "a")
            .with("gone", Condition::new(ComparisonOperator::Null, vec![]));
        assert_eq!(
            serde_json::to_value(&conditions).unwrap(),
            json!({
                "gone": {"ComparisonOperator": "NULL"},
                "id": {"ComparisonOperator": "EQ", "AttributeValueList": [{"S": "a"}]}
            })
        );
    }
}
