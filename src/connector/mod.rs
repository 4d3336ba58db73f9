//! Runs the MQTT connection and hands out a [`Client`] to talk to it.

mod client;
mod error;
mod options;

use crate::adaptor::MqttAdaptor;
use crate::model::LastWill;
use bytes::Bytes;
pub use client::*;
pub use error::*;
pub use options::*;
use rand::{distributions::Alphanumeric, Rng};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS, TlsConfiguration, Transport};
use std::future::Future;
use std::time::Duration;

fn random_client_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(23)
        .map(char::from)
        .collect()
}

pub struct Connector<F, H>
where
    F: FnOnce(Client) -> H,
    H: ConnectorHandler,
{
    options: ConnectorOptions,
    last_will: Option<LastWill>,
    handler: F,
}

pub trait ConnectorHandler {
    type Error: std::error::Error + Send + Sync;

    fn connected(&mut self, state: bool) -> impl Future<Output = Result<(), Self::Error>>;

    /// Home Assistant came (back) online, and discovery information needs to be sent again.
    fn restarted(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// A message for any other subscribed topic, like an entity's command topic.
    fn message(
        &mut self,
        topic: String,
        payload: Bytes,
    ) -> impl Future<Output = Result<(), Self::Error>> {
        let _ = (topic, payload);
        async { Ok(()) }
    }
}

impl<F, H> Connector<F, H>
where
    F: FnOnce(Client) -> H,
    H: ConnectorHandler,
{
    pub fn new(options: ConnectorOptions, handler: F) -> Self {
        Self {
            options,
            last_will: None,
            handler,
        }
    }

    /// Register a last will, normally the one of the device announced through this connection.
    pub fn with_last_will(mut self, last_will: impl Into<Option<LastWill>>) -> Self {
        self.last_will = last_will.into();
        self
    }

    fn mqtt_options(&mut self) -> MqttOptions {
        let client_id = self
            .options
            .client_id
            .take()
            .unwrap_or_else(random_client_id);

        let mut mqttoptions = MqttOptions::new(
            client_id,
            self.options.host.clone(),
            self.options.effective_port(),
        );
        mqttoptions.set_keep_alive(self.options.keep_alive);

        if !self.options.disable_tls {
            mqttoptions.set_transport(Transport::Tls(TlsConfiguration::Native));
        }

        if let Some(last_will) = self.last_will.take().filter(LastWill::is_valid) {
            log::info!("Last will on {}: {}", last_will.topic, last_will.payload);
            mqttoptions.set_last_will(last_will.into());
        }

        log::debug!("Options: {mqttoptions:#?}");

        if let Some(username) = self.options.username.take() {
            mqttoptions.set_credentials(username, self.options.password.take().unwrap_or_default());
        }

        mqttoptions
    }

    pub async fn run(mut self) -> Result<(), Error<H::Error>> {
        let base = self.options.discovery.prefix.clone();
        let status_topic = format!("{base}/status");

        let mqttoptions = self.mqtt_options();
        let (mqtt, mut eventloop) = AsyncClient::new(mqttoptions, 10);

        let client = Client::new(mqtt.clone(), base.clone());
        let mut handler = (self.handler)(client.clone());

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    log::info!("Connected");
                    if let Err(err) = mqtt.try_subscribe(&status_topic, QoS::AtLeastOnce) {
                        log::warn!("Failed to subscribe to the status topic: {err}");
                        mqtt.try_disconnect()?;
                        continue;
                    }
                    client.set_connected(true);
                    handler.connected(true).await.map_err(Error::Handler)?;
                }
                Ok(Event::Incoming(Incoming::Disconnect)) => {
                    log::info!("Disconnected");
                    client.set_connected(false);
                    handler.connected(false).await.map_err(Error::Handler)?;
                }
                Ok(Event::Incoming(Incoming::Publish(publish))) => {
                    log::debug!("Received: {publish:?}");
                    if publish.topic == status_topic {
                        let payload = String::from_utf8_lossy(&publish.payload);
                        log::info!("Home Assistant status: {payload}");
                        if payload == "online" {
                            handler.restarted().await.map_err(Error::Handler)?;
                        }
                    } else {
                        handler
                            .message(publish.topic, publish.payload)
                            .await
                            .map_err(Error::Handler)?;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("Connection failed: {err}");
                    if client.connected() {
                        client.set_connected(false);
                        handler.connected(false).await.map_err(Error::Handler)?;
                    }
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Device, DiscoveryOptions};
    use std::convert::Infallible;

    struct Noop;

    impl ConnectorHandler for Noop {
        type Error = Infallible;

        async fn connected(&mut self, _state: bool) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn restarted(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_mqtt_options() {
        let mut options = ConnectorOptions::new("broker.local");
        options.client_id = Some("doorbell".into());
        options.disable_tls = true;

        let device = Device::new("abc", "Doorbell");
        let mut connector = Connector::new(options, |_| Noop)
            .with_last_will(device.last_will(&DiscoveryOptions::default()));

        let mqtt = connector.mqtt_options();
        assert_eq!(mqtt.client_id(), "doorbell");
        assert_eq!(mqtt.broker_address(), ("broker.local".to_string(), 1883));
        assert_eq!(mqtt.keep_alive(), Duration::from_secs(5));

        let will = mqtt.last_will().unwrap();
        assert_eq!(will.topic, "abc/status");
        assert_eq!(&will.message[..], b"offline");
        assert_eq!(will.qos, QoS::ExactlyOnce);
        assert!(will.retain);
    }

    #[test]
    fn test_random_client_id() {
        let mut connector = Connector::new(ConnectorOptions::new("broker.local"), |_| Noop);
        let mqtt = connector.mqtt_options();
        assert_eq!(mqtt.client_id().len(), 23);
        assert!(mqtt.last_will().is_none());
    }
}
