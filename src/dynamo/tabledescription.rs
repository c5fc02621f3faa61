use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of `DescribeTable`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DescribeTableOutput {
    #[serde(rename = "Table")]
    pub table: TableDescription,
}

/// Table metadata as reported by `DescribeTable`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TableDescription {
    /// Name of the table.
    #[serde(rename = "TableName")]
    pub table_name: String,
    /// Primary key attributes.
    #[serde(rename = "KeySchema", default)]
    pub key_schema: Vec<KeySchemaElement>,
    /// CREATING, UPDATING, DELETING or ACTIVE.
    #[serde(rename = "TableStatus")]
    pub table_status: Option<String>,
    /// Approximate number of items, refreshed every six hours.
    #[serde(rename = "ItemCount")]
    pub item_count: Option<u64>,
    /// Additional fields returned by the API.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// One primary key attribute.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeySchemaElement {
    #[serde(rename = "AttributeName")]
    pub attribute_name: String,
    /// HASH or RANGE.
    #[serde(rename = "KeyType")]
    pub key_type: String,
}

impl TableDescription {
    /// Key attribute names, hash key first.
    pub fn key_names(&self) -> Vec<String> {
        let mut elements: Vec<&KeySchemaElement> = self.key_schema.iter().collect();
        elements.sort_by_key(|element| element.key_type != "HASH");
        elements
            .into_iter()
            .map(|element| element.attribute_name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_key_comes_first() {
        let output: DescribeTableOutput = serde_json::from_str(
            r#"{"Table": {
                "TableName": "events",
                "TableStatus": "ACTIVE",
                "ItemCount": 12,
                "KeySchema": [
                    {"AttributeName": "at", "KeyType": "RANGE"},
                    {"AttributeName": "id", "KeyType": "HASH"}
                ],
                "ProvisionedThroughput": {"ReadCapacityUnits": 5}
            }}"#,
        )
        .unwrap();
        assert_eq!(output.table.key_names(), vec!["id", "at"]);
        assert!(output.table.extra.contains_key("ProvisionedThroughput"));
    }
}
