use std::time::{SystemTime, UNIX_EPOCH};

use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::auth::signature::SigningKeys;
use crate::error::{Error, Result};

const REFRESH_SKEW_SECS: u64 = 300;
const TOKEN_TTL_SECS: &str = "21600";

/// Default address of the EC2 instance metadata service.
pub const METADATA_ENDPOINT: &str = "http://169.254.169.254";

/// Temporary keys with their expiry, as kept between calls.
#[derive(Clone, Debug)]
pub struct CachedKeys {
    pub keys: SigningKeys,
    pub expires_at: Option<u64>,
}

/// Security credentials document served for an instance role.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RoleCredentials {
    code: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    token: Option<String>,
    expiration: Option<String>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// True when keys expiring at `expires_at` (unix seconds) need a refresh.
pub fn is_expiring_soon(expires_at: Option<u64>) -> bool {
    let Some(exp) = expires_at else {
        return true;
    };
    now_secs() + REFRESH_SKEW_SECS >= exp
}

/// Parse an RFC 3339 expiry such as `2024-01-15T18:00:00Z` into epoch seconds.
pub fn parse_expiration(value: &str) -> Option<u64> {
    let parsed = DateTime::parse_from_rfc3339(value.trim()).ok()?;
    u64::try_from(parsed.timestamp()).ok()
}

/// Fetch fresh keys of the instance role using an IMDSv2 session.
pub async fn fetch_keys(client: &Client, endpoint: &str) -> Result<CachedKeys> {
    let endpoint = endpoint.trim_end_matches('/');

    let resp = client
        .put(format!("{endpoint}/latest/api/token"))
        .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECS)
        .send()
        .await?;
    let session = read_text(resp).await?;

    let resp = client
        .get(format!("{endpoint}/latest/meta-data/iam/security-credentials/"))
        .header("X-aws-ec2-metadata-token", &session)
        .send()
        .await?;
    let roles = read_text(resp).await?;
    let role = roles
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| Error::Config("No instance role is attached".to_string()))?;

    let resp = client
        .get(format!(
            "{endpoint}/latest/meta-data/iam/security-credentials/{}",
            urlencoding::encode(role)
        ))
        .header("X-aws-ec2-metadata-token", &session)
        .send()
        .await?;
    let body = read_text(resp).await?;
    let document: RoleCredentials = serde_json::from_str(&body)?;

    match document.code.as_deref() {
        Some("Success") | None => {}
        Some(code) => {
            return Err(Error::transport(format!(
                "Instance role '{role}' returned code {code}"
            )));
        }
    }

    if document.access_key_id.trim().is_empty() {
        return Err(Error::transport("Access key was empty"));
    }

    let mut keys = SigningKeys::new(&document.access_key_id, &document.secret_access_key);
    if let Some(token) = document.token.as_deref() {
        keys = keys.with_session_token(token);
    }

    Ok(CachedKeys {
        keys,
        expires_at: document.expiration.as_deref().and_then(parse_expiration),
    })
}

async fn read_text(resp: reqwest::Response) -> Result<String> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::transport(format!(
            "Instance metadata error ({status}): {body}"
        )));
    }
    Ok(resp.text().await?)
}

/// Cached keys, refreshed five minutes before they expire.
pub async fn get_keys(
    client: &Client,
    endpoint: &str,
    cache: &Mutex<Option<CachedKeys>>,
) -> Result<SigningKeys> {
    let mut cached = cache.lock().await;
    if let Some(current) = cached.as_ref() {
        if !is_expiring_soon(current.expires_at) {
            return Ok(current.keys.clone());
        }
    }

    let refreshed = fetch_keys(client, endpoint).await?;
    let keys = refreshed.keys.clone();
    *cached = Some(refreshed);
    Ok(keys)
}
