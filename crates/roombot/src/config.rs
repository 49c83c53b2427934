//! Connection configuration.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Default bot API endpoint.
pub const DEFAULT_URI: &str = "wss://highrise.game/web/botapi";

/// The server terminates sessions that miss this cadence.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Header carrying the bot's API token during the handshake.
pub const API_TOKEN_HEADER: &str = "api-token";

/// Header carrying the target room during the handshake.
pub const ROOM_ID_HEADER: &str = "room-id";

const ENV_API_TOKEN: &str = "ROOMBOT_API_TOKEN";
const ENV_ROOM_ID: &str = "ROOMBOT_ROOM_ID";
const ENV_URI: &str = "ROOMBOT_URI";

/// Endpoint and credentials for one bot connection.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    pub api_token: String,
    pub room_id: String,
}

fn default_uri() -> String {
    DEFAULT_URI.to_string()
}

impl ConnectionConfig {
    /// Config targeting the default endpoint.
    pub fn new(api_token: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            uri: default_uri(),
            api_token: api_token.into(),
            room_id: room_id.into(),
        }
    }

    /// Override the endpoint URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = uri.into();
        self
    }

    /// Load from `ROOMBOT_API_TOKEN`, `ROOMBOT_ROOM_ID` and the optional
    /// `ROOMBOT_URI`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_token = lookup(ENV_API_TOKEN).ok_or(ConfigError::Missing(ENV_API_TOKEN))?;
        let room_id = lookup(ENV_ROOM_ID).ok_or(ConfigError::Missing(ENV_ROOM_ID))?;
        let config = Self::new(api_token, room_id);

        Ok(match lookup(ENV_URI) {
            Some(uri) => config.with_uri(uri),
            None => config,
        })
    }

    /// Handshake metadata sent as request headers.
    pub fn metadata(&self) -> [(&'static str, &str); 2] {
        [
            (API_TOKEN_HEADER, self.api_token.as_str()),
            (ROOM_ID_HEADER, self.room_id.as_str()),
        ]
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("uri", &self.uri)
            .field("api_token", &"<redacted>")
            .field("room_id", &self.room_id)
            .finish()
    }
}
