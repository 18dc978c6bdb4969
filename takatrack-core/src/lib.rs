//! Core types and the live sync engine for the TakaTrack bin monitor.

/// Edge-triggered full-bin alerting.
pub mod alerts;
/// Viewport framing for the current bins.
pub mod bounds;
/// Raw status classification.
pub mod classify;
/// Environment-driven configuration.
pub mod config;
/// Domain models shared by sources and front ends.
pub mod model;
/// Traits describing the data source and output channels.
pub mod ports;
/// Fixed-cadence refresh loop.
pub mod scheduler;
/// Sync engine applying snapshots.
pub mod service;

pub use alerts::*;
pub use bounds::*;
pub use classify::*;
pub use config::*;
pub use model::*;
pub use ports::*;
pub use scheduler::*;
pub use service::*;
