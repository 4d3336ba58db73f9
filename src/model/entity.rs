use crate::adaptor::{self, MqttAdaptor};
use crate::model::{Device, DeviceId, DiscoveryOptions, IntegrationType, State, StateClass};
use crate::{Outcome, PublishError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::sync::Arc;

// also see: https://www.home-assistant.io/integrations/mqtt/#mqtt-discovery

/// A single capability of a device, announced to Home Assistant with its own discovery
/// message.
#[derive(Clone, Default)]
pub struct Entity {
    pub integration_type: IntegrationType,

    pub name: String,
    /// Derived from the device when empty at the time the entity gets attached.
    pub unique_id: String,
    pub object_id: String,
    pub command_topic: String,
    pub state_topic: String,

    pub(crate) device: Option<DeviceId>,
    state: State,

    attributes: BTreeMap<String, String>,
    arrays: BTreeMap<String, Vec<String>>,

    adaptor: Option<Arc<dyn MqttAdaptor>>,
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("integration_type", &self.integration_type)
            .field("name", &self.name)
            .field("unique_id", &self.unique_id)
            .field("object_id", &self.object_id)
            .field("command_topic", &self.command_topic)
            .field("state_topic", &self.state_topic)
            .field("device", &self.device)
            .field("state", &self.state)
            .field("attributes", &self.attributes)
            .field("arrays", &self.arrays)
            .field("adaptor", &self.adaptor.is_some())
            .finish()
    }
}

impl Entity {
    pub fn new(integration_type: IntegrationType) -> Self {
        Self {
            integration_type,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = unique_id.into();
        self
    }

    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = object_id.into();
        self
    }

    pub fn with_command_topic(mut self, command_topic: impl Into<String>) -> Self {
        self.command_topic = command_topic.into();
        self
    }

    pub fn with_state_topic(mut self, state_topic: impl Into<String>) -> Self {
        self.state_topic = state_topic.into();
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    pub fn with_array<I>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.add_array(key, values);
        self
    }

    /// Set the `device_class` attribute, e.g. from [`crate::model::BinarySensorClass`].
    pub fn with_device_class(self, class: impl AsRef<str>) -> Self {
        self.with_attribute("device_class", class.as_ref())
    }

    pub fn with_state_class(self, class: StateClass) -> Self {
        self.with_attribute("state_class", class.as_ref())
    }

    pub fn set_adaptor(&mut self, adaptor: Arc<dyn MqttAdaptor>) {
        self.adaptor = Some(adaptor);
    }

    pub fn device(&self) -> Option<DeviceId> {
        self.device
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn set_state(&mut self, value: impl Into<String>) {
        self.state.set_text(value);
    }

    pub fn set_state_bytes(&mut self, value: impl Into<Vec<u8>>) {
        self.state.set_binary(value);
    }

    /// Add a free-form discovery attribute, replacing an existing value for the same key.
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Add a discovery attribute which is a list, like the `options` of a select.
    pub fn add_array<I>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.arrays
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    pub fn array(&self, key: &str) -> Option<&[String]> {
        self.arrays.get(key).map(Vec::as_slice)
    }

    pub fn has_array(&self, key: &str) -> bool {
        self.arrays.contains_key(key)
    }

    /// The object id segment of the discovery topic, empty if none can be found.
    fn discovery_object_id(&self, device: Option<&Device>) -> String {
        if !self.unique_id.is_empty() {
            return self.unique_id.clone();
        }
        // legacy form, attaching to a device normally derives a unique id
        match device.and_then(Device::first_identifier) {
            Some(identifier) => format!("{identifier}_{}", self.unique_id),
            None => String::new(),
        }
    }

    /// render the config topic
    pub fn discovery_topic(&self, device: Option<&Device>, options: &DiscoveryOptions) -> String {
        format!(
            "{prefix}/{kind}/{object_id}/config",
            prefix = options.prefix,
            kind = self.integration_type,
            object_id = self.discovery_object_id(device),
        )
    }

    /// Assemble the discovery message.
    ///
    /// Free-form attributes are written first, then the array attributes, then the fixed
    /// fields. So the fixed fields win on colliding keys.
    pub fn discovery_payload(
        &self,
        device: Option<&Device>,
        options: &DiscoveryOptions,
    ) -> Result<Map<String, Value>, serde_json::Error> {
        let mut doc = Map::new();

        for (key, value) in &self.attributes {
            doc.insert(key.clone(), Value::String(value.clone()));
        }
        for (key, values) in &self.arrays {
            doc.insert(
                key.clone(),
                Value::Array(values.iter().cloned().map(Value::String).collect()),
            );
        }

        for (key, value) in [
            ("name", &self.name),
            ("unique_id", &self.unique_id),
            ("object_id", &self.object_id),
            ("command_topic", &self.command_topic),
            ("state_topic", &self.state_topic),
        ] {
            if !value.is_empty() {
                doc.insert(key.to_string(), Value::String(value.clone()));
            }
        }

        if let Some(device) = device {
            if let Some(topic) = device.availability_topic() {
                doc.insert("availability_topic".into(), topic.into());
            }
            doc.insert(
                "payload_available".into(),
                options.payload_available.as_str().into(),
            );
            doc.insert(
                "payload_not_available".into(),
                options.payload_not_available.as_str().into(),
            );

            let mut node = Map::new();
            device.serialize_to(&mut node)?;
            doc.insert("device".into(), Value::Object(node));
        }

        Ok(doc)
    }

    /// Publish the discovery message, retained.
    pub fn publish_discovery(
        &self,
        device: Option<&Device>,
        options: &DiscoveryOptions,
    ) -> Result<Outcome, PublishError> {
        let adaptor = adaptor::connected(self.adaptor.as_ref())?;

        if self.discovery_object_id(device).is_empty() {
            return Err(PublishError::EmptyTopic);
        }
        let topic = self.discovery_topic(device, options);

        let payload = self.discovery_payload(device, options)?;
        if payload.is_empty() {
            return Err(PublishError::EmptyPayload);
        }
        let payload = serde_json::to_string(&payload)?;

        adaptor
            .publish(&topic, &payload, true)
            .inspect_err(|err| log::warn!("failed to announce on {topic}: {err}"))?;
        log::info!("announce {} on {topic}: {payload}", self.unique_id);

        Ok(Outcome::Published)
    }

    /// Publish the current state, if there is one.
    ///
    /// The state is only cleared once the adaptor accepted it.
    pub fn publish_state(&mut self, retained: bool) -> Result<Outcome, PublishError> {
        if self.state_topic.is_empty() || !self.state.is_dirty() {
            return Ok(Outcome::Skipped);
        }

        let adaptor = adaptor::connected(self.adaptor.as_ref())?;
        let topic = &self.state_topic;

        let result = match &self.state {
            State::Empty => return Ok(Outcome::Skipped),
            State::Text(text) => {
                log::debug!("Update state on {topic}: {text}");
                adaptor.publish(topic, text, retained)
            }
            State::Binary(data) => {
                log::debug!("Update state on {topic}: {} bytes", data.len());
                adaptor.publish_bytes(topic, data, retained)
            }
        };
        result.inspect_err(|err| log::warn!("failed to publish state on {topic}: {err}"))?;

        self.state.clear();
        Ok(Outcome::Published)
    }

    pub fn subscribe(&self) -> Result<Outcome, PublishError> {
        if self.command_topic.is_empty() {
            return Ok(Outcome::Skipped);
        }

        let adaptor = adaptor::connected(self.adaptor.as_ref())?;
        let topic = &self.command_topic;
        log::info!("Subscribing to: {topic}");
        adaptor
            .subscribe(topic)
            .inspect_err(|err| log::warn!("failed to subscribe to {topic}: {err}"))?;

        Ok(Outcome::Published)
    }

    pub fn unsubscribe(&self) -> Result<Outcome, PublishError> {
        if self.command_topic.is_empty() {
            return Ok(Outcome::Skipped);
        }

        let adaptor = adaptor::connected(self.adaptor.as_ref())?;
        let topic = &self.command_topic;
        log::info!("Unsubscribing from: {topic}");
        adaptor
            .unsubscribe(topic)
            .inspect_err(|err| log::warn!("failed to unsubscribe from {topic}: {err}"))?;

        Ok(Outcome::Published)
    }
}
