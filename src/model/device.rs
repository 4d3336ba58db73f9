use crate::adaptor::{self, MqttAdaptor};
use crate::model::{DiscoveryOptions, EntityId, LastWill};
use crate::{Outcome, PublishError};
use rumqttc::QoS;
use serde_json::{Map, Value};
use std::fmt::Formatter;
use std::sync::Arc;

/// A physical unit, exposing one or more entities.
///
/// Serializes into the nested `device` object of a discovery payload. Empty optional fields
/// are left out.
#[derive(Clone, Default, serde::Serialize)]
pub struct Device {
    identifiers: Vec<String>,

    /// Name of the device, always serialized.
    pub name: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub manufacturer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hw_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sw_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub configuration_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub suggested_area: String,
    /// Identifier of a device routing messages between this device and Home Assistant.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub via_device: String,

    // set once, by the first identifier
    #[serde(skip)]
    availability_topic: Option<String>,
    #[serde(skip)]
    entities: Vec<EntityId>,
    #[serde(skip)]
    adaptor: Option<Arc<dyn MqttAdaptor>>,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("identifiers", &self.identifiers)
            .field("name", &self.name)
            .field("availability_topic", &self.availability_topic)
            .field("entities", &self.entities)
            .field("adaptor", &self.adaptor.is_some())
            .finish_non_exhaustive()
    }
}

impl Device {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        let mut device = Self {
            name: name.into(),
            ..Default::default()
        };
        device.add_identifier(identifier);
        device
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_hw_version(mut self, hw_version: impl Into<String>) -> Self {
        self.hw_version = hw_version.into();
        self
    }

    pub fn with_sw_version(mut self, sw_version: impl Into<String>) -> Self {
        self.sw_version = sw_version.into();
        self
    }

    pub fn with_configuration_url(mut self, configuration_url: impl Into<String>) -> Self {
        self.configuration_url = configuration_url.into();
        self
    }

    pub fn with_suggested_area(mut self, suggested_area: impl Into<String>) -> Self {
        self.suggested_area = suggested_area.into();
        self
    }

    pub fn with_via_device(mut self, via_device: impl Into<String>) -> Self {
        self.via_device = via_device.into();
        self
    }

    pub fn set_adaptor(&mut self, adaptor: Arc<dyn MqttAdaptor>) {
        self.adaptor = Some(adaptor);
    }

    /// Add an identifier. The first one also fixes the availability topic.
    pub fn add_identifier(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.identifiers.is_empty() {
            self.availability_topic = Some(format!("{value}/status"));
        }
        self.identifiers.push(value);
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn identifier(&self, index: usize) -> Option<&str> {
        self.identifiers.get(index).map(String::as_str)
    }

    pub fn first_identifier(&self) -> Option<&str> {
        self.identifier(0)
    }

    pub fn availability_topic(&self) -> Option<&str> {
        self.availability_topic.as_deref()
    }

    /// Record an entity as part of this device, returning its index.
    ///
    /// Does not check for duplicates, use [`Self::entity_index`] first.
    pub fn add_entity(&mut self, entity: EntityId) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    pub fn entity_index(&self, entity: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| *e == entity)
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// The last will to register with the broker, once the device has an identifier.
    pub fn last_will(&self, options: &DiscoveryOptions) -> Option<LastWill> {
        let topic = self.availability_topic.as_ref()?;
        Some(LastWill {
            topic: topic.clone(),
            payload: options.payload_not_available.clone(),
            qos: QoS::ExactlyOnce,
            retain: true,
        })
    }

    /// Announce the device as available or unavailable.
    pub fn publish_status(
        &self,
        online: bool,
        options: &DiscoveryOptions,
    ) -> Result<Outcome, PublishError> {
        let adaptor = adaptor::connected(self.adaptor.as_ref())?;
        let topic = self
            .availability_topic
            .as_deref()
            .ok_or(PublishError::EmptyTopic)?;

        let payload = if online {
            &options.payload_available
        } else {
            &options.payload_not_available
        };

        adaptor
            .publish(topic, payload, false)
            .inspect_err(|err| log::warn!("failed to publish device status on {topic}: {err}"))?;
        log::info!("Device status on {topic}: {payload}");

        Ok(Outcome::Published)
    }

    /// Write the device fields into a JSON object.
    pub fn serialize_to(&self, node: &mut Map<String, Value>) -> Result<(), serde_json::Error> {
        if let Value::Object(fields) = serde_json::to_value(self)? {
            node.extend(fields);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::adaptor::memory::{MemoryAdaptor, Payload};
    use serde_json::json;

    #[test]
    fn test_availability_topic_frozen() {
        let mut device = Device::default();
        assert_eq!(device.availability_topic(), None);
        assert_eq!(device.last_will(&DiscoveryOptions::default()), None);

        device.add_identifier("abc");
        assert_eq!(device.availability_topic(), Some("abc/status"));

        device.add_identifier("def");
        assert_eq!(device.availability_topic(), Some("abc/status"));
        assert_eq!(device.identifiers(), ["abc", "def"]);
    }

    #[test]
    fn test_entity_index() {
        let mut device = Device::new("abc", "Doorbell");
        assert_eq!(device.entity_index(EntityId(7)), None);

        assert_eq!(device.add_entity(EntityId(7)), 0);
        assert_eq!(device.add_entity(EntityId(3)), 1);
        assert_eq!(device.entity_index(EntityId(3)), Some(1));
        assert_eq!(device.entity_index(EntityId(7)), Some(0));
        assert_eq!(device.entity_index(EntityId(0)), None);
    }

    #[test]
    fn test_last_will() {
        let device = Device::new("abc", "Doorbell");
        let will = device.last_will(&DiscoveryOptions::default()).unwrap();
        assert_eq!(
            will,
            LastWill {
                topic: "abc/status".into(),
                payload: "offline".into(),
                qos: QoS::ExactlyOnce,
                retain: true,
            }
        );
        assert!(will.is_valid());
    }

    #[test]
    fn test_serialize_minimal() {
        let device = Device::default();
        assert_eq!(
            serde_json::to_value(&device).unwrap(),
            json!({
                "identifiers": [],
                "name": "",
            })
        );
    }

    #[test]
    fn test_serialize_full() {
        let mut device = Device::new("abc", "Doorbell")
            .with_manufacturer("ACME")
            .with_model("DB-1")
            .with_hw_version("rev2")
            .with_sw_version("1.0.3")
            .with_configuration_url("http://192.168.1.20/")
            .with_suggested_area("Entrance");
        device.add_identifier("mac:00:11:22");

        let mut node = Map::new();
        node.insert("keep".into(), json!(true));
        device.serialize_to(&mut node).unwrap();

        assert_eq!(
            Value::Object(node),
            json!({
                "keep": true,
                "identifiers": ["abc", "mac:00:11:22"],
                "name": "Doorbell",
                "manufacturer": "ACME",
                "model": "DB-1",
                "hw_version": "rev2",
                "sw_version": "1.0.3",
                "configuration_url": "http://192.168.1.20/",
                "suggested_area": "Entrance",
            })
        );
    }

    #[test]
    fn test_publish_status() {
        let options = DiscoveryOptions::default();
        let mut device = Device::new("abc", "Doorbell");

        assert!(matches!(
            device.publish_status(true, &options),
            Err(PublishError::NoAdaptor)
        ));

        let adaptor = Arc::new(MemoryAdaptor::new());
        device.set_adaptor(adaptor.clone());

        adaptor.set_connected(false);
        assert!(matches!(
            device.publish_status(true, &options),
            Err(PublishError::NotConnected)
        ));
        assert!(adaptor.published().is_empty());

        adaptor.set_connected(true);
        device.publish_status(true, &options).unwrap();
        device.publish_status(false, &options).unwrap();

        let published = adaptor.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].topic, "abc/status");
        assert_eq!(published[0].payload, Payload::Text("online".into()));
        assert_eq!(published[1].payload, Payload::Text("offline".into()));
    }

    #[test]
    fn test_publish_status_without_identifier() {
        let mut device = Device::default();
        let adaptor = Arc::new(MemoryAdaptor::new());
        device.set_adaptor(adaptor.clone());

        assert!(matches!(
            device.publish_status(true, &DiscoveryOptions::default()),
            Err(PublishError::EmptyTopic)
        ));
        assert!(adaptor.published().is_empty());
    }
}
