use super::{AdaptorError, MqttAdaptor};
use std::sync::{Mutex, MutexGuard};

/// A payload as it was handed to the adaptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub payload: Payload,
    pub retained: bool,
}

#[derive(Debug, Default)]
struct Inner {
    connected: bool,
    failing: bool,
    published: Vec<Message>,
    subscriptions: Vec<String>,
}

/// An adaptor which records everything instead of talking to a broker.
#[derive(Debug, Default)]
pub struct MemoryAdaptor {
    inner: Mutex<Inner>,
}

impl MemoryAdaptor {
    /// Create a new, connected, adaptor.
    pub fn new() -> Self {
        let adaptor = Self::default();
        adaptor.set_connected(true);
        adaptor
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    /// Let every following request fail, while still reporting to be connected.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn published(&self) -> Vec<Message> {
        self.lock().published.clone()
    }

    pub fn take_published(&self) -> Vec<Message> {
        std::mem::take(&mut self.lock().published)
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.lock().subscriptions.clone()
    }

    fn record(&self, topic: &str, payload: Payload, retained: bool) -> Result<(), AdaptorError> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(AdaptorError::Rejected(format!("publish to {topic}")));
        }
        inner.published.push(Message {
            topic: topic.to_string(),
            payload,
            retained,
        });
        Ok(())
    }
}

impl MqttAdaptor for MemoryAdaptor {
    fn connected(&self) -> bool {
        self.lock().connected
    }

    fn publish(&self, topic: &str, payload: &str, retained: bool) -> Result<(), AdaptorError> {
        self.record(topic, Payload::Text(payload.to_string()), retained)
    }

    fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        retained: bool,
    ) -> Result<(), AdaptorError> {
        self.record(topic, Payload::Binary(payload.to_vec()), retained)
    }

    fn subscribe(&self, topic: &str) -> Result<(), AdaptorError> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(AdaptorError::Rejected(format!("subscribe to {topic}")));
        }
        inner.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), AdaptorError> {
        let mut inner = self.lock();
        if inner.failing {
            return Err(AdaptorError::Rejected(format!("unsubscribe from {topic}")));
        }
        inner.subscriptions.retain(|t| t != topic);
        Ok(())
    }
}
