mod device;
mod device_class;
mod entity;
mod id;
mod integration;
mod last_will;
mod options;
mod state;

pub use device::*;
pub use device_class::*;
pub use entity::*;
pub use id::*;
pub use integration::*;
pub use last_will::*;
pub use options::*;
pub use state::*;
