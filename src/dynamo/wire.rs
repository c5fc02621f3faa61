//! Request and response bodies of the DynamoDB JSON 1.0 protocol.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dynamo::attributes::{AttributeUpdates, Attributes};
use crate::dynamo::conditions::Conditions;
use crate::dynamo::request::{Operation, PageRequest, Select};
use crate::dynamo::value::AttributeValue;

const TOTAL: &str = "TOTAL";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PageInput<'a> {
    table_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_conditions: Option<&'a Conditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan_filter: Option<&'a Conditions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scan_index_forward: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes_to_get: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    select: Option<Select>,
    consistent_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclusive_start_key: Option<&'a Attributes>,
    return_consumed_capacity: &'static str,
}

impl<'a> From<&'a PageRequest> for PageInput<'a> {
    fn from(request: &'a PageRequest) -> Self {
        let conditions = (!request.conditions.is_empty()).then_some(&request.conditions);
        let query = request.operation == Operation::Query;
        // AttributesToGet is only legal together with SPECIFIC_ATTRIBUTES.
        let projected = !request.attributes_to_get.is_empty()
            && matches!(request.select, None | Some(Select::SpecificAttributes));
        let select = match request.select {
            Some(Select::SpecificAttributes) if !projected => None,
            other => other,
        };
        Self {
            table_name: &request.table,
            key_conditions: if query { conditions } else { None },
            scan_filter: if query { None } else { conditions },
            limit: request.limit,
            scan_index_forward: query.then_some(request.forward),
            attributes_to_get: projected.then_some(request.attributes_to_get.as_slice()),
            index_name: request.index.as_deref(),
            select,
            consistent_read: request.consistent,
            exclusive_start_key: request.exclusive_start_key.as_ref(),
            return_consumed_capacity: TOTAL,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GetItemInput<'a> {
    pub table_name: &'a str,
    pub key: &'a Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes_to_get: Option<&'a [String]>,
    pub consistent_read: bool,
    pub return_consumed_capacity: &'static str,
}

impl<'a> GetItemInput<'a> {
    pub fn new(table: &'a str, key: &'a Attributes, names: &'a [String], consistent: bool) -> Self {
        Self {
            table_name: table,
            key,
            attributes_to_get: (!names.is_empty()).then_some(names),
            consistent_read: consistent,
            return_consumed_capacity: TOTAL,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PutItemInput<'a> {
    pub table_name: &'a str,
    pub item: &'a Attributes,
    pub return_consumed_capacity: &'static str,
}

impl<'a> PutItemInput<'a> {
    pub fn new(table: &'a str, item: &'a Attributes) -> Self {
        Self {
            table_name: table,
            item,
            return_consumed_capacity: TOTAL,
        }
    }
}

/// Legacy `Expected` entry: the attribute must exist with this value.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ExpectedValue<'a> {
    value: &'a AttributeValue,
    exists: bool,
}

fn expected_map(expected: Option<&Attributes>) -> Option<BTreeMap<&str, ExpectedValue<'_>>> {
    let expected = expected.filter(|attrs| !attrs.is_empty())?;
    Some(
        expected
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    ExpectedValue {
                        value,
                        exists: true,
                    },
                )
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UpdateItemInput<'a> {
    pub table_name: &'a str,
    pub key: &'a Attributes,
    pub attribute_updates: &'a AttributeUpdates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<BTreeMap<&'a str, ExpectedValue<'a>>>,
    pub return_values: &'static str,
    pub return_consumed_capacity: &'static str,
}

impl<'a> UpdateItemInput<'a> {
    pub fn new(
        table: &'a str,
        key: &'a Attributes,
        updates: &'a AttributeUpdates,
        expected: Option<&'a Attributes>,
    ) -> Self {
        Self {
            table_name: table,
            key,
            attribute_updates: updates,
            expected: expected_map(expected),
            return_values: "UPDATED_NEW",
            return_consumed_capacity: TOTAL,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DeleteItemInput<'a> {
    pub table_name: &'a str,
    pub key: &'a Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<BTreeMap<&'a str, ExpectedValue<'a>>>,
    pub return_consumed_capacity: &'static str,
}

impl<'a> DeleteItemInput<'a> {
    pub fn new(table: &'a str, key: &'a Attributes, expected: Option<&'a Attributes>) -> Self {
        Self {
            table_name: table,
            key,
            expected: expected_map(expected),
            return_consumed_capacity: TOTAL,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DescribeTableInput<'a> {
    pub table_name: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ConsumedCapacity {
    pub capacity_units: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct PageOutput {
    #[serde(default)]
    pub items: Vec<Attributes>,
    pub last_evaluated_key: Option<Attributes>,
    pub count: Option<usize>,
    pub consumed_capacity: Option<ConsumedCapacity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ItemOutput {
    pub item: Option<Attributes>,
    pub attributes: Option<Attributes>,
    pub consumed_capacity: Option<ConsumedCapacity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_uses_key_conditions() {
        let request = PageRequest::query("users")
            .with_conditions(Conditions::new().with_eq("id", "a"))
            .with_limit(20)
            .with_attributes_to_get(["id", "name"])
            .with_select(Select::SpecificAttributes)
            .with_consistent_read(true);
        assert_eq!(
            serde_json::to_value(PageInput::from(&request)).unwrap(),
            json!({
                "TableName": "users",
                "KeyConditions": {
                    "id": {"ComparisonOperator": "EQ", "AttributeValueList": [{"S": "a"}]}
                },
                "Limit": 20,
                "ScanIndexForward": true,
                "AttributesToGet": ["id", "name"],
                "Select": "SPECIFIC_ATTRIBUTES",
                "ConsistentRead": true,
                "ReturnConsumedCapacity": "TOTAL"
            })
        );
    }

    #[test]
    fn count_scan_drops_projection() {
        let request = PageRequest::scan("users")
            .with_attributes_to_get(["id"])
            .with_select(Select::Count)
            .with_exclusive_start_key(Attributes::new().with("id", "z"));
        assert_eq!(
            serde_json::to_value(PageInput::from(&request)).unwrap(),
            json!({
                "TableName": "users",
                "Select": "COUNT",
                "ConsistentRead": false,
                "ExclusiveStartKey": {"id": {"S": "z"}},
                "ReturnConsumedCapacity": "TOTAL"
            })
        );
    }

    #[test]
    fn delete_carries_expected_keys() {
        let key = Attributes::new().with("id", "a");
        let input = DeleteItemInput::new("users", &key, Some(&key));
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({
                "TableName": "users",
                "Key": {"id": {"S": "a"}},
                "Expected": {"id": {"Value": {"S": "a"}, "Exists": true}},
                "ReturnConsumedCapacity": "TOTAL"
            })
        );
    }

    #[test]
    fn reads_page_output() {
        let output: PageOutput = serde_json::from_value(json!({
            "Items": [{"id": {"S": "a"}}],
            "Count": 1,
            "ScannedCount": 3,
            "LastEvaluatedKey": {"id": {"S": "a"}},
            "ConsumedCapacity": {"TableName": "users", "CapacityUnits": 0.5}
        }))
        .unwrap();
        assert_eq!(output.items.len(), 1);
        assert_eq!(output.count, Some(1));
        assert!(output.last_evaluated_key.is_some());
        assert_eq!(output.consumed_capacity.unwrap().capacity_units, Some(0.5));
    }
}
