use reqwest::StatusCode;
use serde_json::Value;

use crate::dynamo::transport::{Capacity, Page};
use crate::dynamo::wire::{ConsumedCapacity, PageOutput};
use crate::error::Error;

/// Convert the reported consumed capacity.
pub(crate) fn parse_capacity(consumed: Option<&ConsumedCapacity>) -> Capacity {
    Capacity(consumed.and_then(|c| c.capacity_units))
}

/// Build a page from a query or scan response.
pub(crate) fn parse_page(output: PageOutput) -> Page {
    let capacity = parse_capacity(output.consumed_capacity.as_ref());
    let count = output.count.unwrap_or(output.items.len());
    Page {
        items: output.items,
        last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        count,
        capacity,
    }
}

/// Turn a non-2xx response into a transport error.
///
/// The body is `{"__type": "com.amazonaws.dynamodb.v20120810#Code", "message": "..."}`;
/// only the part after `#` is kept.
pub(crate) fn parse_error(status: StatusCode, body: &str) -> Error {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return Error::transport(format!("DynamoDB API error ({status}): {body}"));
    };

    let code = json
        .get("__type")
        .and_then(|v| v.as_str())
        .map(|t| t.rsplit('#').next().unwrap_or(t))
        .unwrap_or("Unknown");
    let message = json
        .get("message")
        .or_else(|| json.get("Message"))
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    Error::transport(format!("DynamoDB API error ({status}) {code}: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamo::attributes::Attributes;

    #[test]
    fn extracts_code_and_message() {
        let error = parse_error(
            StatusCode::BAD_REQUEST,
            r#"{"__type":"com.amazonaws.dynamodb.v20120810#ConditionalCheckFailedException","message":"The conditional request failed"}"#,
        );
        assert_eq!(
            error,
            Error::Transport(
                "DynamoDB API error (400 Bad Request) ConditionalCheckFailedException: The conditional request failed"
                    .to_string()
            )
        );
    }

    #[test]
    fn keeps_unparseable_bodies() {
        let error = parse_error(StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(
            error,
            Error::Transport("DynamoDB API error (502 Bad Gateway): <html>".to_string())
        );
    }

    #[test]
    fn empty_last_key_ends_the_result() {
        let page = parse_page(PageOutput {
            items: vec![Attributes::new().with("id", "a")],
            last_evaluated_key: Some(Attributes::new()),
            count: None,
            consumed_capacity: None,
        });
        assert!(page.last_evaluated_key.is_none());
        assert_eq!(page.count, 1);
        assert_eq!(page.capacity, Capacity::unknown());
    }
}
