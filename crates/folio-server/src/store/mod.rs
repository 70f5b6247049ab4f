pub mod config;
pub mod model;

pub use config::{AdminDefaults, ConfigStore};
pub use model::{AdminCredential, ConfigDocument, Message, Meta, Stats, SCHEMA_VERSION};
