//! The transport capability the model uses for all of its I/O.

pub mod memory;

use crate::PublishError;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AdaptorError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Access to an MQTT connection.
///
/// None of the operations block. A failure only means "not done yet", callers try again on a
/// later cycle.
pub trait MqttAdaptor: Send + Sync {
    fn connected(&self) -> bool;

    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), AdaptorError> {
        self.publish_bytes(topic, payload.as_bytes(), retained)
    }

    fn publish_bytes(&self, topic: &str, payload: &[u8], retained: bool)
        -> Result<(), AdaptorError>;

    fn subscribe(&self, topic: &str) -> Result<(), AdaptorError>;

    fn unsubscribe(&self, topic: &str) -> Result<(), AdaptorError>;
}

/// Resolve an optional adaptor into one that is ready for I/O.
pub(crate) fn connected(
    adaptor: Option<&Arc<dyn MqttAdaptor>>,
) -> Result<&dyn MqttAdaptor, PublishError> {
    let adaptor = adaptor.ok_or(PublishError::NoAdaptor)?;
    if !adaptor.connected() {
        return Err(PublishError::NotConnected);
    }
    Ok(adaptor.as_ref())
}
