use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::LogLevel;
use crate::auth::signature::{SigningKeys, extract_host, sign_request};
use crate::dynamo::attributes::{AttributeUpdates, Attributes};
use crate::dynamo::parse::{parse_capacity, parse_error, parse_page};
use crate::dynamo::request::PageRequest;
use crate::dynamo::tabledescription::{DescribeTableOutput, TableDescription};
use crate::dynamo::transport::{Page, Reply, Transport};
use crate::dynamo::wire::{
    DeleteItemInput, DescribeTableInput, GetItemInput, ItemOutput, PageInput, PageOutput,
    PutItemInput, UpdateItemInput,
};
use crate::error::{Error, Result};

pub(crate) const CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const TARGET_PREFIX: &str = "DynamoDB_20120810";

/// HTTP client for the DynamoDB JSON 1.0 API.
pub struct ServiceClient {
    client: Client,
    base_url: String,
    host: String,
    region: String,
    keys: SigningKeys,
    log_level: LogLevel,
}

impl ServiceClient {
    /// Create a client for `endpoint`, signing with `keys` for `region`.
    pub fn new(
        client: Client,
        endpoint: &str,
        region: &str,
        keys: SigningKeys,
        log_level: LogLevel,
    ) -> Result<Self> {
        let base_url = endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            host: extract_host(&base_url)?,
            base_url,
            region: region.to_string(),
            keys,
            log_level,
        })
    }

    /// Describe a table.
    pub async fn describe_table(&self, table: &str) -> Result<TableDescription> {
        let output: DescribeTableOutput = self
            .post("DescribeTable", &DescribeTableInput { table_name: table })
            .await?;
        Ok(output.table)
    }

    /// Sign and send one operation, decoding the JSON response.
    async fn post<I: Serialize, O: DeserializeOwned>(&self, operation: &str, input: &I) -> Result<O> {
        let target = format!("{TARGET_PREFIX}.{operation}");
        let body = serde_json::to_vec(input)?;

        if self.log_level.is_debug() {
            log::debug!("{}: {}", target, String::from_utf8_lossy(&body));
        }

        let signed = sign_request(
            &self.keys,
            &self.region,
            &self.host,
            &target,
            &body,
            Utc::now(),
        )?;

        let mut request = self
            .client
            .post(format!("{}/", self.base_url))
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", &target)
            .header("X-Amz-Date", &signed.amz_date)
            .header("Authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let resp = request
            .body(body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::transport(format!("Failed to read response: {e}")))?;

        if self.log_level.is_debug() {
            log::debug!("{} ({}): {}", target, status, text);
        }

        if !status.is_success() {
            return Err(parse_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| Error::transport(format!("Failed to parse JSON: {e}")))
    }
}

#[async_trait]
impl Transport for ServiceClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        let output: PageOutput = self
            .post(request.operation.target(), &PageInput::from(request))
            .await?;
        Ok(parse_page(output))
    }

    async fn get_item(
        &self,
        table: &str,
        key: &Attributes,
        attributes: &[String],
        consistent: bool,
    ) -> Result<Reply<Option<Attributes>>> {
        let output: ItemOutput = self
            .post("GetItem", &GetItemInput::new(table, key, attributes, consistent))
            .await?;
        Ok(Reply::new(
            output.item,
            parse_capacity(output.consumed_capacity.as_ref()),
        ))
    }

    async fn put_item(&self, table: &str, item: &Attributes) -> Result<Reply<()>> {
        let output: ItemOutput = self.post("PutItem", &PutItemInput::new(table, item)).await?;
        Ok(Reply::new((), parse_capacity(output.consumed_capacity.as_ref())))
    }

    async fn update_item(
        &self,
        table: &str,
        key: &Attributes,
        updates: &AttributeUpdates,
        expected: Option<&Attributes>,
    ) -> Result<Reply<Attributes>> {
        let output: ItemOutput = self
            .post(
                "UpdateItem",
                &UpdateItemInput::new(table, key, updates, expected),
            )
            .await?;
        Ok(Reply::new(
            output.attributes.unwrap_or_default(),
            parse_capacity(output.consumed_capacity.as_ref()),
        ))
    }

    async fn delete_item(
        &self,
        table: &str,
        key: &Attributes,
        expected: Option<&Attributes>,
    ) -> Result<Reply<()>> {
        let output: ItemOutput = self
            .post("DeleteItem", &DeleteItemInput::new(table, key, expected))
            .await?;
        Ok(Reply::new((), parse_capacity(output.consumed_capacity.as_ref())))
    }

    async fn describe_keys(&self, table: &str) -> Result<Vec<String>> {
        let keys = self.describe_table(table).await?.key_names();
        if keys.is_empty() {
            return Err(Error::Config(format!("Table \"{table}\" has no key schema")));
        }
        Ok(keys)
    }
}
