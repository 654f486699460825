use crate::{env_or_default, env_parse, ConfigError, FromEnv};

/// Dapr sidecar settings for booking event publication
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventsConfig {
    pub dapr_http_port: u16,
    pub pubsub_name: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            dapr_http_port: 3500,
            pubsub_name: "bookings-pubsub".to_string(),
        }
    }
}

impl FromEnv for EventsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            dapr_http_port: env_parse("DAPR_HTTP_PORT", defaults.dapr_http_port)?,
            pubsub_name: env_or_default("DAPR_PUBSUB_NAME", &defaults.pubsub_name),
        })
    }
}
