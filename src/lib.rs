//! Home Assistant MQTT discovery.
//!
//! Devices and their entities live in a caller owned [`Registry`]. From that model the crate
//! derives unique ids, discovery topics and discovery payloads, and tracks which entity states
//! still need to be sent. All I/O goes through an [`adaptor::MqttAdaptor`], either the
//! [`connector::Client`] backed by `rumqttc` or the in-memory one used in tests.

pub mod adaptor;
pub mod connector;
pub mod model;

mod error;
mod registry;
mod utils;

pub use error::*;
pub use registry::*;
