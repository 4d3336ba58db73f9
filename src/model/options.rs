/// Settings shared by everything producing discovery topics and payloads.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct DiscoveryOptions {
    /// Discovery prefix, defaults to `homeassistant`
    #[serde(default = "default_prefix")]
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "discovery-prefix",
            env = "DISCOVERY_PREFIX",
            default_value = "homeassistant"
        )
    )]
    pub prefix: String,

    /// Payload announcing a device as available, defaults to `online`
    #[serde(default = "default_payload_available")]
    #[cfg_attr(feature = "clap", arg(long, env, default_value = "online"))]
    pub payload_available: String,

    /// Payload announcing a device as unavailable, defaults to `offline`
    #[serde(default = "default_payload_not_available")]
    #[cfg_attr(feature = "clap", arg(long, env, default_value = "offline"))]
    pub payload_not_available: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            payload_available: default_payload_available(),
            payload_not_available: default_payload_not_available(),
        }
    }
}

fn default_prefix() -> String {
    "homeassistant".to_string()
}

fn default_payload_available() -> String {
    "online".to_string()
}

fn default_payload_not_available() -> String {
    "offline".to_string()
}
