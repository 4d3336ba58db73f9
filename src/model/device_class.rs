//! Typed values for the `device_class` and `state_class` discovery attributes.
//!
//! Also see: <https://www.home-assistant.io/integrations/sensor/#device-class>

#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ButtonClass {
    Identify,
    Restart,
    Update,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BinarySensorClass {
    Battery,
    Connectivity,
    Door,
    Lock,
    Motion,
    Occupancy,
    Opening,
    Problem,
    Sound,
    Tamper,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SensorClass {
    Battery,
    Duration,
    Humidity,
    Illuminance,
    SignalStrength,
    Temperature,
    Timestamp,
    Voltage,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SwitchClass {
    Outlet,
    Switch,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(BinarySensorClass::Motion.as_ref(), "motion");
        assert_eq!(SensorClass::SignalStrength.as_ref(), "signal_strength");
        assert_eq!(StateClass::TotalIncreasing.as_ref(), "total_increasing");
        assert_eq!(ButtonClass::Restart.to_string(), "restart");
    }
}
