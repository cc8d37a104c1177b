//! Service ports: data contracts shared with the adapters.

pub mod settings;

pub use settings::{MappingRule, Settings};
