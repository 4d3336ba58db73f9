use rumqttc::QoS;

/// The message the broker publishes on behalf of a client which disconnected ungracefully.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub qos: QoS,
    pub retain: bool,
}

impl LastWill {
    pub fn is_valid(&self) -> bool {
        !self.topic.is_empty() && !self.payload.is_empty()
    }
}

impl From<LastWill> for rumqttc::LastWill {
    fn from(value: LastWill) -> Self {
        rumqttc::LastWill::new(value.topic, value.payload, value.qos, value.retain)
    }
}
