use crate::adaptor::{AdaptorError, MqttAdaptor};
use rumqttc::{AsyncClient, QoS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Handle to the connector's MQTT connection.
///
/// Requests are queued without waiting, so the client can be used from the synchronous model.
#[derive(Clone)]
pub struct Client {
    pub mqtt: AsyncClient,

    pub(crate) base_topic: String,
    pub(crate) connected: Arc<AtomicBool>,
}

impl Client {
    pub(crate) fn new(mqtt: AsyncClient, base_topic: String) -> Self {
        Self {
            mqtt,
            base_topic,
            connected: Default::default(),
        }
    }

    /// The discovery prefix this client was set up with.
    pub fn base_topic(&self) -> &str {
        &self.base_topic
    }

    pub(crate) fn set_connected(&self, state: bool) {
        self.connected.store(state, Ordering::Release);
    }
}

impl MqttAdaptor for Client {
    fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> Result<(), AdaptorError> {
        self.mqtt
            .try_publish(topic, QoS::AtLeastOnce, retained, payload.to_vec())
            .inspect_err(|err| {
                log::warn!("failed to publish to {topic}: {err}");
            })?;

        Ok(())
    }

    fn subscribe(&self, topic: &str) -> Result<(), AdaptorError> {
        self.mqtt.try_subscribe(topic, QoS::AtLeastOnce)?;
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), AdaptorError> {
        self.mqtt.try_unsubscribe(topic)?;
        Ok(())
    }
}
