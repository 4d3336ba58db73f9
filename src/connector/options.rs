use crate::model::DiscoveryOptions;
use crate::utils::is_default;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
pub struct ConnectorOptions {
    /// The MQTT client id, defaults to a random ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub client_id: Option<String>,

    /// Discovery prefix and availability payloads
    #[serde(flatten)]
    #[cfg_attr(feature = "clap", command(flatten))]
    pub discovery: DiscoveryOptions,

    /// The MQTT's servers/brokers hostname
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub host: String,

    /// The MQTT's server/brokers port, defaults to 1883 without TLS and 8883 with TLS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub port: Option<u16>,

    /// TLS is used by default, you can disable it here.
    #[serde(default, skip_serializing_if = "is_default")]
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub disable_tls: bool,

    #[serde(default = "default_keep_alive")]
    #[serde(with = "humantime_serde")]
    #[cfg_attr(feature = "clap", arg(long, env, value_parser = DurationValueParser, default_value = "5s"))]
    #[cfg_attr(feature = "schemars", schemars(schema_with = "humantime_duration"))]
    pub keep_alive: Duration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "clap", arg(long, env))]
    pub password: Option<String>,
}

impl ConnectorOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            client_id: None,
            discovery: Default::default(),
            host: host.into(),
            port: None,
            disable_tls: false,
            keep_alive: default_keep_alive(),
            username: None,
            password: None,
        }
    }

    /// The port to connect to, taking TLS into account.
    pub fn effective_port(&self) -> u16 {
        self.port
            .unwrap_or(if self.disable_tls { 1883 } else { 8883 })
    }
}

#[cfg(feature = "schemars")]
fn humantime_duration(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
    use schemars::schema::*;
    use schemars::JsonSchema;
    use serde_json::json;

    let mut schema: SchemaObject = <String>::json_schema(gen).into();
    schema.metadata = Some(Box::new(Metadata {
        id: None,
        title: None,
        description: Some(r#"A duration in the humantime format. For example: '30s' for 30 seconds. '5m' for 5 minutes."#.to_string()),
        default: None,
        deprecated: false,
        read_only: false,
        write_only: false,
        examples: vec![json!("30s"), json!("1m")],
    }));
    schema.into()
}

#[cfg(feature = "clap")]
#[derive(Clone)]
pub struct DurationValueParser;

#[cfg(feature = "clap")]
impl clap::builder::TypedValueParser for DurationValueParser {
    type Value = Duration;

    fn parse_ref(
        &self,
        cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        use std::str::FromStr;
        Ok(humantime::Duration::from_str(&value.to_string_lossy())
            .map_err(|_err| clap::Error::new(clap::error::ErrorKind::Format).with_cmd(cmd))?
            .into())
    }
}

fn default_keep_alive() -> Duration {
    Duration::from_secs(5)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options: ConnectorOptions =
            serde_json::from_value(json!({"host": "broker.local"})).unwrap();

        assert_eq!(options, ConnectorOptions::new("broker.local"));
        assert_eq!(options.effective_port(), 8883);
        assert_eq!(options.discovery.prefix, "homeassistant");
    }

    #[test]
    fn test_full() {
        let options: ConnectorOptions = serde_json::from_value(json!({
            "host": "broker.local",
            "prefix": "ha",
            "disable_tls": true,
            "keep_alive": "30s",
            "username": "doorbell",
        }))
        .unwrap();

        assert_eq!(options.effective_port(), 1883);
        assert_eq!(options.discovery.prefix, "ha");
        assert_eq!(options.discovery.payload_available, "online");
        assert_eq!(options.keep_alive, Duration::from_secs(30));
        assert_eq!(options.username.as_deref(), Some("doorbell"));
    }
}
