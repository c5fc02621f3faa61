use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Represents a DynamoDB attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum AttributeValue {
    /// String value.
    S(String),
    /// Number, kept as the decimal text the store uses.
    N(String),
    /// Binary value.
    B(Vec<u8>),
    /// Boolean value.
    Bool(bool),
    /// Null value.
    Null,
    /// String set.
    Ss(Vec<String>),
    /// Number set.
    Ns(Vec<String>),
    /// Binary set.
    Bs(Vec<Vec<u8>>),
    /// List of values.
    L(Vec<AttributeValue>),
    /// Nested map of values.
    M(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// String content, if this is an `S` value.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(text) => Some(text),
            _ => None,
        }
    }

    /// Number text, if this is an `N` value.
    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(text) => Some(text),
            _ => None,
        }
    }

    /// Parsed number, if this is an `N` value holding a valid decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        self.as_n().and_then(|text| parse_number(text))
    }

    /// Boolean content, if this is a `BOOL` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Order two scalar values of the same type.
    ///
    /// Numbers compare numerically, strings and binaries lexicographically.
    /// Anything else (mixed types, sets, documents) is unordered.
    pub fn compare(&self, other: &AttributeValue) -> Option<Ordering> {
        match (self, other) {
            (AttributeValue::S(left), AttributeValue::S(right)) => Some(left.cmp(right)),
            (AttributeValue::N(left), AttributeValue::N(right)) => {
                Some(parse_number(left)?.cmp(&parse_number(right)?))
            }
            (AttributeValue::B(left), AttributeValue::B(right)) => Some(left.cmp(right)),
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::S(text) => write!(f, "{{S: {text}}}"),
            AttributeValue::N(text) => write!(f, "{{N: {text}}}"),
            AttributeValue::B(bytes) => write!(f, "{{B: {} byte(s)}}", bytes.len()),
            AttributeValue::Bool(flag) => write!(f, "{{BOOL: {flag}}}"),
            AttributeValue::Null => write!(f, "{{NULL: true}}"),
            AttributeValue::Ss(items) => write!(f, "{{SS: {items:?}}}"),
            AttributeValue::Ns(items) => write!(f, "{{NS: {items:?}}}"),
            AttributeValue::Bs(items) => write!(f, "{{BS: {} item(s)}}", items.len()),
            AttributeValue::L(items) => write!(f, "{{L: {} item(s)}}", items.len()),
            AttributeValue::M(items) => write!(f, "{{M: {} item(s)}}", items.len()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<&String> for AttributeValue {
    fn from(value: &String) -> Self {
        AttributeValue::S(value.clone())
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::N(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::N(value.to_string())
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::N(value.to_string())
    }
}

impl From<Decimal> for AttributeValue {
    fn from(value: Decimal) -> Self {
        AttributeValue::N(value.normalize().to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(value: Vec<u8>) -> Self {
        AttributeValue::B(value)
    }
}

/// DynamoDB JSON shape of an attribute value, e.g. `{"S": "text"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum WireValue {
    S(String),
    N(String),
    B(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(Vec<String>),
    L(Vec<WireValue>),
    M(BTreeMap<String, WireValue>),
}

impl From<AttributeValue> for WireValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::S(text) => WireValue::S(text),
            AttributeValue::N(text) => WireValue::N(text),
            AttributeValue::B(bytes) => WireValue::B(STANDARD.encode(bytes)),
            AttributeValue::Bool(flag) => WireValue::Bool(flag),
            AttributeValue::Null => WireValue::Null(true),
            AttributeValue::Ss(items) => WireValue::Ss(items),
            AttributeValue::Ns(items) => WireValue::Ns(items),
            AttributeValue::Bs(items) => {
                WireValue::Bs(items.into_iter().map(|bytes| STANDARD.encode(bytes)).collect())
            }
            AttributeValue::L(items) => WireValue::L(items.into_iter().map(WireValue::from).collect()),
            AttributeValue::M(items) => WireValue::M(
                items
                    .into_iter()
                    .map(|(name, value)| (name, WireValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<WireValue> for AttributeValue {
    type Error = String;

    fn try_from(value: WireValue) -> Result<Self, Self::Error> {
        let decode = |text: &str| {
            STANDARD
                .decode(text)
                .map_err(|e| format!("Invalid base64 in binary attribute: {e}"))
        };
        Ok(match value {
            WireValue::S(text) => AttributeValue::S(text),
            WireValue::N(text) => AttributeValue::N(text),
            WireValue::B(text) => AttributeValue::B(decode(&text)?),
            WireValue::Bool(flag) => AttributeValue::Bool(flag),
            WireValue::Null(_) => AttributeValue::Null,
            WireValue::Ss(items) => AttributeValue::Ss(items),
            WireValue::Ns(items) => AttributeValue::Ns(items),
            WireValue::Bs(items) => AttributeValue::Bs(
                items
                    .iter()
                    .map(|text| decode(text))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            WireValue::L(items) => AttributeValue::L(
                items
                    .into_iter()
                    .map(AttributeValue::try_from)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            WireValue::M(items) => AttributeValue::M(
                items
                    .into_iter()
                    .map(|(name, value)| AttributeValue::try_from(value).map(|v| (name, v)))
                    .collect::<Result<BTreeMap<_, _>, _>>()?,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_in_dynamodb_json_shape() {
        let value = AttributeValue::M(BTreeMap::from([
            ("name".to_string(), AttributeValue::from("Jeff")),
            ("age".to_string(), AttributeValue::from(42)),
            ("gone".to_string(), AttributeValue::Null),
            ("blob".to_string(), AttributeValue::B(b"hi".to_vec())),
        ]));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"M": {
                "age": {"N": "42"},
                "blob": {"B": "aGk="},
                "gone": {"NULL": true},
                "name": {"S": "Jeff"}
            }})
        );
    }

    #[test]
    fn rejects_broken_base64() {
        let parsed = serde_json::from_value::<AttributeValue>(json!({"B": "***"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn compares_numbers_numerically() {
        let nine = AttributeValue::from(9);
        let ten = AttributeValue::from(10);
        assert_eq!(nine.compare(&ten), Some(Ordering::Less));
        assert_eq!(
            AttributeValue::from("9").compare(&AttributeValue::from("10")),
            Some(Ordering::Greater)
        );
        assert_eq!(nine.compare(&AttributeValue::from("9")), None);
    }

    #[test]
    fn decimals_are_normalized_numbers() {
        let value = AttributeValue::from(Decimal::new(1500, 2));
        assert_eq!(value.as_n(), Some("15"));
        assert_eq!(value.as_decimal(), Some(Decimal::from(15)));
    }
}
