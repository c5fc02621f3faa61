use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::LogLevel;
use crate::auth::signature::SigningKeys;
use crate::auth::token::{CachedKeys, METADATA_ENDPOINT, get_keys};
use crate::dynamo::serviceclient::ServiceClient;
use crate::dynamo::transport::Transport;
use crate::error::{Error, Result};

/// Source of short-lived transport handles.
///
/// Every remote operation asks for a handle, uses it, and drops it before
/// returning.
#[async_trait]
pub trait Credentials: Send + Sync + fmt::Debug + fmt::Display {
    /// A transport for one operation, dropped when it completes.
    async fn aws(&self) -> Result<Box<dyn Transport>>;
}

/// Static access keys for one region's public endpoint.
#[derive(Clone)]
pub struct Simple {
    keys: SigningKeys,
    region: String,
    log_level: LogLevel,
    client: Client,
}

impl Simple {
    /// Static keys for the public endpoint of `region`.
    pub fn new(key: &str, secret: &str, region: &str) -> Self {
        Self {
            keys: SigningKeys::new(key, secret),
            region: region.to_string(),
            log_level: LogLevel::default(),
            client: Client::new(),
        }
    }

    /// Dummy keys, good for DynamoDB Local and the in-memory store.
    pub fn test() -> Self {
        Self::new("AAAAAAAAAAAAAAAAAAAA", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", "us-east-1")
    }

    /// Keys of `profile` from the shared credentials file in the home directory.
    pub fn from_profile(profile: &str, region: &str) -> Result<Self> {
        let path = shared_credentials_file()?;
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let keys = parse_profile(&contents, profile)?;
        Ok(Self {
            keys,
            ..Self::new("", "", region)
        })
    }

    /// Attach the session token of temporary keys.
    pub fn with_session_token(mut self, token: &str) -> Self {
        self.keys = self.keys.with_session_token(token);
        self
    }

    /// Log level of the service clients handed out.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Region name these keys sign for.
    pub fn region(&self) -> &str {
        &self.region
    }

    fn endpoint(&self) -> Result<String> {
        regional_endpoint(&self.region)
    }

    fn client_for(&self, endpoint: &str) -> Result<ServiceClient> {
        ServiceClient::new(
            self.client.clone(),
            endpoint,
            &self.region,
            self.keys.clone(),
            self.log_level,
        )
    }
}

#[async_trait]
impl Credentials for Simple {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        let endpoint = self.endpoint()?;
        Ok(Box::new(self.client_for(&endpoint)?))
    }
}

impl fmt::Debug for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Simple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.keys.access_key)
    }
}

/// Static keys against an explicit endpoint, e.g. DynamoDB Local.
#[derive(Clone)]
pub struct Direct {
    origin: Simple,
    endpoint: String,
}

impl Direct {
    /// Keys of `origin` sent to `endpoint` instead of the regional one.
    pub fn new(origin: Simple, endpoint: &str) -> Self {
        Self {
            origin,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// DynamoDB Local listening on `port`.
    pub fn local(origin: Simple, port: u16) -> Self {
        Self::new(origin, &format!("http://localhost:{port}"))
    }
}

#[async_trait]
impl Credentials for Direct {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(self.origin.client_for(&self.endpoint)?))
    }
}

impl fmt::Debug for Direct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Direct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.origin, self.endpoint)
    }
}

/// Temporary keys of the instance role, from the instance metadata service.
#[derive(Clone)]
pub struct Assumed {
    region: String,
    metadata: String,
    log_level: LogLevel,
    client: Client,
    cache: Arc<Mutex<Option<CachedKeys>>>,
}

impl Assumed {
    /// Instance-role keys for `region`, from the default metadata endpoint.
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            metadata: METADATA_ENDPOINT.to_string(),
            log_level: LogLevel::default(),
            client: Client::new(),
            cache: Arc::new(Mutex::new(None)),
        }
    }

    /// Use another metadata service, e.g. a local emulator.
    pub fn with_metadata_endpoint(mut self, endpoint: &str) -> Self {
        self.metadata = endpoint.to_string();
        self
    }

    /// Log level of the service clients handed out.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

#[async_trait]
impl Credentials for Assumed {
    async fn aws(&self) -> Result<Box<dyn Transport>> {
        let keys = get_keys(&self.client, &self.metadata, &self.cache).await?;
        let simple = Simple {
            keys,
            region: self.region.clone(),
            log_level: self.log_level,
            client: self.client.clone(),
        };
        simple.aws().await
    }
}

impl fmt::Debug for Assumed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Assumed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/instance-role", self.region)
    }
}

fn shared_credentials_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(".aws").join("credentials"))
        .ok_or_else(|| Error::Config("Unable to locate the home directory".to_string()))
}

/// Keys of one profile in an INI-style shared credentials file.
pub fn parse_profile(contents: &str, profile: &str) -> Result<SigningKeys> {
    let mut in_profile = false;
    let mut key = None;
    let mut secret = None;
    let mut token = None;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            in_profile = section.trim() == profile;
            continue;
        }
        if !in_profile {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match name.trim() {
            "aws_access_key_id" => key = Some(value),
            "aws_secret_access_key" => secret = Some(value),
            "aws_session_token" => token = Some(value),
            _ => {}
        }
    }

    match (key, secret) {
        (Some(key), Some(secret)) => {
            let keys = SigningKeys::new(&key, &secret);
            Ok(match token {
                Some(token) => keys.with_session_token(&token),
                None => keys,
            })
        }
        _ => Err(Error::Config(format!(
            "Profile '{profile}' has no access keys"
        ))),
    }
}

/// Public DynamoDB endpoint of `region`; China regions live under their own
/// domain.
fn regional_endpoint(region: &str) -> Result<String> {
    if !is_region_name(region) {
        return Err(Error::Config(format!("Failed to find region '{region}'")));
    }
    let domain = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    Ok(format!("https://dynamodb.{region}.{domain}"))
}

fn is_region_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('-').collect();
    parts.len() >= 3
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
        && parts
            .last()
            .is_some_and(|last| last.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: &str = "
[default]
aws_access_key_id = AKIDDEFAULT
aws_secret_access_key = defaultsecret

# staging keys
[staging]
aws_access_key_id=AKIDSTAGING
aws_secret_access_key=stagingsecret
aws_session_token=stagingtoken
";

    #[test]
    fn reads_the_named_profile() {
        let keys = parse_profile(PROFILES, "staging").unwrap();
        assert_eq!(keys.access_key, "AKIDSTAGING");
        assert_eq!(keys.secret_key, "stagingsecret");
        assert_eq!(keys.session_token.as_deref(), Some("stagingtoken"));

        let keys = parse_profile(PROFILES, "default").unwrap();
        assert_eq!(keys.access_key, "AKIDDEFAULT");
        assert!(keys.session_token.is_none());
    }

    #[test]
    fn missing_profile_is_a_config_error() {
        assert!(matches!(
            parse_profile(PROFILES, "prod"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn printing_never_shows_the_secret() {
        let creds = Simple::new("AKID", "topsecret", "eu-west-1");
        assert_eq!(creds.to_string(), "eu-west-1/AKID");
        assert!(!format!("{creds:?}").contains("topsecret"));
        let local = Direct::local(creds, 8000);
        assert_eq!(local.to_string(), "eu-west-1/AKID@http://localhost:8000");
    }

    #[tokio::test]
    async fn unknown_region_is_rejected() {
        let creds = Simple::new("AKID", "secret", "moon");
        assert_eq!(
            creds.aws().await.err(),
            Some(Error::Config("Failed to find region 'moon'".to_string()))
        );
        assert!(Simple::test().aws().await.is_ok());
        assert!(Simple::new("k", "s", "us-gov-west-1").aws().await.is_ok());
    }

    #[test]
    fn china_regions_use_their_own_domain() {
        assert_eq!(
            regional_endpoint("cn-north-1").unwrap(),
            "https://dynamodb.cn-north-1.amazonaws.com.cn"
        );
        assert_eq!(
            regional_endpoint("eu-west-1").unwrap(),
            "https://dynamodb.eu-west-1.amazonaws.com"
        );
    }
}
