//! AWS Signature Version 4 for DynamoDB JSON requests.
//!
//! Every request is a `POST /` with an empty query string, so the canonical
//! request only varies by host, date, target and body.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const SERVICE: &str = "dynamodb";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Access keys used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKeys {
    pub access_key: String,
    pub secret_key: String,
    /// Session token of temporary keys.
    pub session_token: Option<String>,
}

impl SigningKeys {
    /// Long-lived access key pair.
    pub fn new(access_key: &str, secret_key: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            session_token: None,
        }
    }

    /// Temporary keys also carry a session token.
    pub fn with_session_token(mut self, token: &str) -> Self {
        self.session_token = Some(token.to_string());
        self
    }
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("access_key", &self.access_key)
            .field("session_token", &self.session_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Header values to attach to a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
    pub security_token: Option<String>,
}

/// Sign one DynamoDB JSON 1.0 request.
pub fn sign_request(
    keys: &SigningKeys,
    region: &str,
    host: &str,
    target: &str,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<SignedHeaders> {
    let date_str = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let credential_scope = format!("{date_str}/{region}/{SERVICE}/aws4_request");

    let mut canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-amz-date:{}\n",
        crate::dynamo::serviceclient::CONTENT_TYPE,
        host,
        amz_date
    );
    let mut signed_headers = String::from("content-type;host;x-amz-date");
    if let Some(token) = &keys.session_token {
        canonical_headers.push_str(&format!("x-amz-security-token:{token}\n"));
        signed_headers.push_str(";x-amz-security-token");
    }
    canonical_headers.push_str(&format!("x-amz-target:{target}\n"));
    signed_headers.push_str(";x-amz-target");

    let canonical_request = format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers,
        signed_headers,
        hex_sha256(body)
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        credential_scope,
        hex_sha256(canonical_request.as_bytes())
    );

    let signature = calculate_signature(&keys.secret_key, &date_str, region, &string_to_sign)?;

    Ok(SignedHeaders {
        amz_date,
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, keys.access_key, credential_scope, signed_headers, signature
        ),
        security_token: keys.session_token.clone(),
    })
}

/// Host (with port, when present) of an endpoint URL.
pub fn extract_host(endpoint: &str) -> Result<String> {
    let host = endpoint
        .strip_prefix("http://")
        .or_else(|| endpoint.strip_prefix("https://"))
        .unwrap_or(endpoint);
    let host = host.split('/').next().unwrap_or(host);

    if host.is_empty() {
        return Err(Error::Config(format!("Invalid endpoint '{endpoint}'")));
    }

    Ok(host.to_string())
}

fn hex_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| Error::Config(format!("Invalid signing key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn calculate_signature(
    secret_key: &str,
    date: &str,
    region: &str,
    string_to_sign: &str,
) -> Result<String> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    Ok(hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?))
}
