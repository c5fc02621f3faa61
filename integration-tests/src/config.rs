use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Connection settings for a live endpoint, usually DynamoDB Local.
#[derive(Debug, Deserialize)]
pub struct Secrets {
    pub endpoint: String,
    pub key: String,
    pub secret: String,
    pub region: String,
    /// An existing table with a single string hash key.
    pub table: String,
}

/// Read `secrets.json` from the working directory, or `None` when there is
/// no such file.
pub fn load_secrets() -> Result<Option<Secrets>, String> {
    let mut path = std::env::current_dir().map_err(|e| e.to_string())?;
    path.push("secrets.json");
    if !path.exists() {
        return Ok(None);
    }
    read_secrets(&path).map(Some)
}

fn read_secrets(path: &Path) -> Result<Secrets, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("Failed to read secrets.json: {e}"))?;
    serde_json::from_str(&contents).map_err(|e| format!("Invalid secrets.json: {e}"))
}
