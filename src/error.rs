use crate::adaptor::AdaptorError;

/// Successful result of a publish or subscribe request.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The request was handed to the adaptor, which accepted it.
    Published,
    /// There was nothing to do, no I/O was performed.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("no MQTT adaptor configured")]
    NoAdaptor,
    #[error("MQTT adaptor is not connected")]
    NotConnected,
    #[error("topic is empty")]
    EmptyTopic,
    #[error("payload is empty")]
    EmptyPayload,
    #[error("serialization failure")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Adaptor(#[from] AdaptorError),
}
