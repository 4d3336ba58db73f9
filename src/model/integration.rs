/// The kind of capability an entity exposes, the MQTT integration in Home Assistant terms.
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    PartialEq,
    Hash,
    Debug,
    strum::AsRefStr,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum IntegrationType {
    AlarmControlPanel,
    #[default]
    BinarySensor,
    Button,
    Camera,
    Cover,
    DeviceTracker,
    #[strum(serialize = "device_automation")]
    DeviceTrigger,
    Fan,
    Humidifier,
    Image,
    #[strum(serialize = "climate")]
    ClimateHvac,
    Light,
    Lock,
    Number,
    Scene,
    Select,
    Sensor,
    Siren,
    Switch,
    Update,
    #[strum(serialize = "tag")]
    TagScanner,
    Text,
    Vacuum,
    /// Published as `water_heater`, so derived unique ids read `<id>_water_heater<n>`.
    WaterHeater,
}

impl IntegrationType {
    /// The category string used in discovery topics and derived unique ids.
    pub fn type_name(&self) -> &'static str {
        self.into()
    }
}
