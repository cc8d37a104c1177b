//! Services layer (ports + adapters).
//!
//! - `ports`: data contracts (settings schema).
//! - `adapters`: filesystem-backed implementations (paths, settings file).

pub mod adapters;
pub mod ports;
