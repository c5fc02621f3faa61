/// Credentials, request signing and instance-profile keys.
pub mod auth;
/// DynamoDB frames, valves, cursors and the HTTP service client.
pub mod dynamo;
/// Error and result types shared by the crate.
pub mod error;
/// In-memory store for tests.
pub mod mock;
/// Retrying decorators over frames, valves, cursors, tables and regions.
pub mod retry;

pub use error::{Error, Result};

/// Logging verbosity for SDK operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Dump request and response payloads at `debug`.
    Debug,
    /// Emit round-trip summaries only.
    #[default]
    Information,
}

impl LogLevel {
    /// True when wire payloads should be logged.
    pub fn is_debug(&self) -> bool {
        matches!(self, LogLevel::Debug)
    }
}
