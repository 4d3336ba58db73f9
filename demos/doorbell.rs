//! A doorbell, announcing a ring sensor, a chime switch and a ringtone select

use bytes::Bytes;
use clap::Parser;
use homeassistant_discovery::connector::{Client, Connector, ConnectorHandler, ConnectorOptions};
use homeassistant_discovery::model::{
    BinarySensorClass, Device, DeviceId, Entity, IntegrationType, SensorClass, StateClass,
};
use homeassistant_discovery::Registry;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::MissedTickBehavior;

#[derive(Debug, clap::Parser)]
struct Cli {
    /// Device identifier, also the base of all state topics
    #[arg(long, env, default_value = "doorbell-1")]
    device_id: String,

    #[command(flatten)]
    connector: ConnectorOptions,
}

#[derive(Clone)]
struct Doorbell {
    registry: Arc<Mutex<Registry>>,
    device: DeviceId,
}

impl Doorbell {
    fn new(registry: Registry, device: DeviceId) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
            device,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self) {
        let registry = self.lock();

        if let Err(err) = registry.publish_device_status(self.device, true) {
            log::warn!("Failed to announce availability: {err}");
        }

        for entity in registry.entities() {
            if let Err(err) = registry.publish_discovery(entity) {
                log::warn!("Failed to announce {entity}: {err}");
            }
            if let Err(err) = registry.subscribe(entity) {
                log::warn!("Failed to subscribe {entity}: {err}");
            }
        }
    }

    fn publish_states(&self) {
        let mut registry = self.lock();
        for entity in registry.entities().collect::<Vec<_>>() {
            // failed states stay dirty and are retried on the next tick
            if let Err(err) = registry.publish_state(entity, false) {
                log::debug!("State of {entity} not sent: {err}");
            }
        }
    }
}

struct Handler {
    doorbell: Doorbell,
    client: Client,
}

impl ConnectorHandler for Handler {
    type Error = Infallible;

    async fn connected(&mut self, state: bool) -> Result<(), Self::Error> {
        log::info!("Connected: {state}");
        if state {
            self.doorbell
                .lock()
                .set_adaptor(Arc::new(self.client.clone()));
            self.doorbell.announce();
            self.doorbell.publish_states();
        }
        Ok(())
    }

    async fn restarted(&mut self) -> Result<(), Self::Error> {
        log::info!("Restarted");
        self.doorbell.announce();
        Ok(())
    }

    async fn message(&mut self, topic: String, payload: Bytes) -> Result<(), Self::Error> {
        let mut registry = self.doorbell.lock();
        match registry.entity_by_command_topic(&topic) {
            Some(entity) => {
                let value = String::from_utf8_lossy(&payload).to_string();
                log::info!("Command for {entity}: {value}");
                // echo back as the new state
                registry[entity].set_state(value);
            }
            None => log::info!("Skipping unknown topic: {topic}"),
        }
        drop(registry);

        self.doorbell.publish_states();
        Ok(())
    }
}

fn build(device_id: &str, options: &ConnectorOptions) -> (Registry, DeviceId) {
    let mut registry = Registry::new(options.discovery.clone());

    let device = registry.add_device(
        Device::new(device_id, "Doorbell")
            .with_manufacturer("ACME")
            .with_model("DB-1")
            .with_sw_version(env!("CARGO_PKG_VERSION")),
    );

    let entities = [
        Entity::new(IntegrationType::BinarySensor)
            .with_name("Ring")
            .with_state_topic(format!("{device_id}/ring"))
            .with_device_class(BinarySensorClass::Sound),
        Entity::new(IntegrationType::Sensor)
            .with_name("Signal")
            .with_state_topic(format!("{device_id}/signal"))
            .with_device_class(SensorClass::SignalStrength)
            .with_state_class(StateClass::Measurement)
            .with_attribute("unit_of_measurement", "dBm"),
        Entity::new(IntegrationType::Switch)
            .with_name("Chime")
            .with_state_topic(format!("{device_id}/chime"))
            .with_command_topic(format!("{device_id}/chime/set")),
        Entity::new(IntegrationType::Select)
            .with_name("Ringtone")
            .with_state_topic(format!("{device_id}/ringtone"))
            .with_command_topic(format!("{device_id}/ringtone/set"))
            .with_array("options", ["classic", "westminster", "silent"]),
    ];

    for entity in entities {
        let entity = registry.add_entity(entity);
        registry.set_device(entity, device);
    }

    (registry, device)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    log::info!("Starting up doorbell");

    let (registry, device) = build(&cli.device_id, &cli.connector);
    let last_will = registry.last_will(device);
    let doorbell = Doorbell::new(registry, device);

    let ticker = doorbell.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ringing = false;
        loop {
            interval.tick().await;
            {
                let mut registry = ticker.lock();
                for entity in registry.entities().collect::<Vec<_>>() {
                    let entity = &mut registry[entity];
                    match entity.integration_type {
                        IntegrationType::BinarySensor => {
                            entity.set_state(if ringing { "ON" } else { "OFF" })
                        }
                        IntegrationType::Sensor => entity.set_state("-61"),
                        _ => {}
                    }
                }
            }
            ringing = !ringing;
            ticker.publish_states();
        }
    });

    let connector = Connector::new(cli.connector, |client| Handler { doorbell, client })
        .with_last_will(last_will);
    connector.run().await?;

    log::info!("Exiting");

    Ok(())
}
