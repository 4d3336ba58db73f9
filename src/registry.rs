use crate::adaptor::MqttAdaptor;
use crate::model::{Device, DeviceId, DiscoveryOptions, Entity, EntityId, LastWill};
use crate::{Outcome, PublishError};
use serde_json::{Map, Value};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// Owns devices and entities, and resolves the relations between them.
///
/// Devices and entities only refer to each other by their ids. Handles are only valid for the
/// registry which created them, indexing with a foreign handle may panic.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    options: DiscoveryOptions,
    devices: Vec<Device>,
    entities: Vec<Entity>,
}

impl Registry {
    pub fn new(options: DiscoveryOptions) -> Self {
        Self {
            options,
            devices: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    pub fn add_device(&mut self, device: Device) -> DeviceId {
        self.devices.push(device);
        DeviceId(self.devices.len() - 1)
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        EntityId(self.entities.len() - 1)
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(id.0)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn devices(&self) -> impl Iterator<Item = DeviceId> {
        (0..self.devices.len()).map(DeviceId)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> {
        (0..self.entities.len()).map(EntityId)
    }

    /// Use the same adaptor for all devices and entities known so far.
    pub fn set_adaptor(&mut self, adaptor: Arc<dyn MqttAdaptor>) {
        for device in &mut self.devices {
            device.set_adaptor(adaptor.clone());
        }
        for entity in &mut self.entities {
            entity.set_adaptor(adaptor.clone());
        }
    }

    /// Attach an entity to a device.
    ///
    /// An entity without a unique id gets one derived from the device:
    /// `<first identifier>_<integration type><index>`. The entity registers itself with the
    /// device for that, unless it already is. An existing unique id is never replaced.
    pub fn set_device(&mut self, entity: EntityId, device: DeviceId) {
        let target = &mut self.entities[entity.0];
        let owner = &mut self.devices[device.0];

        target.device = Some(device);

        if !target.unique_id.is_empty() {
            return;
        }
        let Some(identifier) = owner.first_identifier().map(ToString::to_string) else {
            return;
        };

        let index = match owner.entity_index(entity) {
            Some(index) => index,
            None => owner.add_entity(entity),
        };
        let unique_id = format!("{identifier}_{}{index}", target.integration_type);

        log::debug!("Derived unique id for {entity}: {unique_id}");
        target.unique_id = unique_id;
    }

    fn resolve(&self, entity: EntityId) -> (&Entity, Option<&Device>) {
        let entity = &self[entity];
        let device = entity.device.and_then(|id| self.device(id));
        (entity, device)
    }

    pub fn discovery_topic(&self, entity: EntityId) -> String {
        let (entity, device) = self.resolve(entity);
        entity.discovery_topic(device, &self.options)
    }

    pub fn discovery_payload(
        &self,
        entity: EntityId,
    ) -> Result<Map<String, Value>, serde_json::Error> {
        let (entity, device) = self.resolve(entity);
        entity.discovery_payload(device, &self.options)
    }

    pub fn publish_discovery(&self, entity: EntityId) -> Result<Outcome, PublishError> {
        let (entity, device) = self.resolve(entity);
        entity.publish_discovery(device, &self.options)
    }

    pub fn publish_state(
        &mut self,
        entity: EntityId,
        retained: bool,
    ) -> Result<Outcome, PublishError> {
        self[entity].publish_state(retained)
    }

    pub fn subscribe(&self, entity: EntityId) -> Result<Outcome, PublishError> {
        self[entity].subscribe()
    }

    pub fn publish_device_status(
        &self,
        device: DeviceId,
        online: bool,
    ) -> Result<Outcome, PublishError> {
        self[device].publish_status(online, &self.options)
    }

    pub fn last_will(&self, device: DeviceId) -> Option<LastWill> {
        self.device(device)?.last_will(&self.options)
    }

    /// Find the entity listening on a command topic.
    pub fn entity_by_command_topic(&self, topic: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .position(|e| !e.command_topic.is_empty() && e.command_topic == topic)
            .map(EntityId)
    }
}

impl Index<DeviceId> for Registry {
    type Output = Device;

    fn index(&self, id: DeviceId) -> &Self::Output {
        &self.devices[id.0]
    }
}

impl IndexMut<DeviceId> for Registry {
    fn index_mut(&mut self, id: DeviceId) -> &mut Self::Output {
        &mut self.devices[id.0]
    }
}

impl Index<EntityId> for Registry {
    type Output = Entity;

    fn index(&self, id: EntityId) -> &Self::Output {
        &self.entities[id.0]
    }
}

impl IndexMut<EntityId> for Registry {
    fn index_mut(&mut self, id: EntityId) -> &mut Self::Output {
        &mut self.entities[id.0]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::adaptor::memory::{MemoryAdaptor, Payload};
    use crate::model::IntegrationType;
    use serde_json::json;

    fn doorbell() -> (Registry, DeviceId) {
        let mut registry = Registry::default();
        let device = registry.add_device(Device::new("abc", "Doorbell").with_manufacturer("ACME"));
        (registry, device)
    }

    #[test]
    fn test_derive_unique_id() {
        let (mut registry, device) = doorbell();

        let ring = registry.add_entity(Entity::new(IntegrationType::BinarySensor));
        let signal = registry.add_entity(Entity::new(IntegrationType::Sensor));

        registry.set_device(ring, device);
        registry.set_device(signal, device);

        assert_eq!(registry[ring].unique_id, "abc_binary_sensor0");
        assert_eq!(registry[signal].unique_id, "abc_sensor1");
        assert_eq!(registry[ring].device(), Some(device));
        assert_eq!(registry[device].entities(), [ring, signal]);
    }

    #[test]
    fn test_set_device_twice() {
        let (mut registry, device) = doorbell();
        let ring = registry.add_entity(Entity::new(IntegrationType::BinarySensor));

        registry.set_device(ring, device);
        registry.set_device(ring, device);

        assert_eq!(registry[ring].unique_id, "abc_binary_sensor0");
        assert_eq!(registry[device].entities(), [ring]);
    }

    #[test]
    fn test_keep_user_unique_id() {
        let (mut registry, device) = doorbell();
        let ring = registry.add_entity(Entity::new(IntegrationType::Button).with_unique_id("bell"));

        registry.set_device(ring, device);

        assert_eq!(registry[ring].unique_id, "bell");
        assert_eq!(registry[ring].device(), Some(device));
        assert_eq!(registry[device].entity_index(ring), None);
    }

    #[test]
    fn test_device_without_identifier() {
        let mut registry = Registry::default();
        let device = registry.add_device(Device::default());
        let ring = registry.add_entity(Entity::new(IntegrationType::BinarySensor));

        registry.set_device(ring, device);

        assert_eq!(registry[ring].unique_id, "");
        assert!(registry[device].entities().is_empty());
        assert_eq!(registry.last_will(device), None);

        let adaptor = Arc::new(MemoryAdaptor::new());
        registry.set_adaptor(adaptor.clone());
        assert!(matches!(
            registry.publish_discovery(ring),
            Err(PublishError::EmptyTopic)
        ));
        assert!(adaptor.published().is_empty());
    }

    #[test]
    fn test_discovery_round_trip() {
        let (mut registry, device) = doorbell();
        let door = registry.add_entity(
            Entity::new(IntegrationType::Sensor)
                .with_name("Front Door")
                .with_state_topic("t/state"),
        );
        registry.set_device(door, device);

        assert_eq!(
            registry.discovery_topic(door),
            "homeassistant/sensor/abc_sensor0/config"
        );
        assert_eq!(
            Value::Object(registry.discovery_payload(door).unwrap()),
            json!({
                "name": "Front Door",
                "unique_id": "abc_sensor0",
                "state_topic": "t/state",
                "availability_topic": "abc/status",
                "payload_available": "online",
                "payload_not_available": "offline",
                "device": {
                    "identifiers": ["abc"],
                    "name": "Doorbell",
                    "manufacturer": "ACME",
                },
            })
        );
    }

    #[test]
    fn test_custom_options() {
        let mut registry = Registry::new(DiscoveryOptions {
            prefix: "ha".into(),
            payload_available: "up".into(),
            payload_not_available: "down".into(),
        });
        let device = registry.add_device(Device::new("abc", "Doorbell"));
        let lock = registry.add_entity(Entity::new(IntegrationType::Lock));
        registry.set_device(lock, device);

        assert_eq!(registry.discovery_topic(lock), "ha/lock/abc_lock0/config");
        let payload = registry.discovery_payload(lock).unwrap();
        assert_eq!(payload["payload_available"], "up");
        assert_eq!(payload["payload_not_available"], "down");
        assert_eq!(registry.last_will(device).unwrap().payload, "down");
    }

    #[test]
    fn test_publish_cycle() {
        let (mut registry, device) = doorbell();
        let ring = registry.add_entity(
            Entity::new(IntegrationType::BinarySensor)
                .with_name("Ring")
                .with_state_topic("abc/ring"),
        );
        let chime = registry.add_entity(
            Entity::new(IntegrationType::Switch)
                .with_name("Chime")
                .with_command_topic("abc/chime/set"),
        );
        registry.set_device(ring, device);
        registry.set_device(chime, device);

        let adaptor = Arc::new(MemoryAdaptor::new());
        registry.set_adaptor(adaptor.clone());

        registry.publish_device_status(device, true).unwrap();
        for entity in registry.entities().collect::<Vec<_>>() {
            registry.publish_discovery(entity).unwrap();
            registry.subscribe(entity).unwrap();
        }

        registry[ring].set_state("ON");
        assert_eq!(registry.publish_state(ring, false).unwrap(), Outcome::Published);
        assert_eq!(registry.publish_state(ring, false).unwrap(), Outcome::Skipped);
        assert_eq!(registry.publish_state(chime, false).unwrap(), Outcome::Skipped);

        let topics: Vec<_> = adaptor
            .published()
            .into_iter()
            .map(|message| message.topic)
            .collect();
        assert_eq!(
            topics,
            [
                "abc/status",
                "homeassistant/binary_sensor/abc_binary_sensor0/config",
                "homeassistant/switch/abc_switch1/config",
                "abc/ring",
            ]
        );
        assert_eq!(adaptor.subscriptions(), ["abc/chime/set"]);
        assert_eq!(registry.entity_by_command_topic("abc/chime/set"), Some(chime));
        assert_eq!(registry.entity_by_command_topic("abc/ring"), None);

        let last = adaptor.take_published().pop().unwrap();
        assert_eq!(last.payload, Payload::Text("ON".into()));
    }
}
