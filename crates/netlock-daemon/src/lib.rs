//! Netlock Daemon - HTTP service for device lock timers
//!
//! This crate provides:
//! - Settings persistence, optionally encrypted at rest
//! - A registry actor serializing every change to the settings document
//! - Admin address seeding from the host's network interfaces
//! - The axum HTTP API

pub mod api;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod registry;
pub mod store;

pub use api::{app, router, AppState};
pub use config::DaemonConfig;
pub use error::{DaemonError, Result};
pub use registry::Registry;
pub use store::{FileStore, MemoryStore, SettingsStore};
