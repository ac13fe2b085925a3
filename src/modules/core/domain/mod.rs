//! Domain models for Restbridge configuration

mod config;
mod connection;
mod definition;
mod options;

pub use config::{AdapterConfig, CollectionConfig};
pub use connection::{BasicAuth, CacheSettings, ConnectionConfig, HookSettings, MethodMap};
pub use definition::{Attribute, CollectionDefinition};
pub use options::{id_segment, is_scalar_id, QueryOptions, PAGINATION_KEYS};
