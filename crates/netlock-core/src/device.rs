//! Managed devices

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// Placement on the 2D device layout, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position(pub i64, pub i64);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// A managed endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Canonical address (unique key)
    pub address: Address,

    /// Instant (ms) before which the device is locked out
    #[serde(default)]
    pub lock_after: i64,

    /// Layout position (unique)
    #[serde(default)]
    pub position: Position,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,

    /// Last status poll (ms)
    #[serde(default)]
    pub last_online: i64,

    /// Pending "show time info" command deadline (ms)
    #[serde(default)]
    pub show_time: i64,

    /// Pending restart command deadline (ms)
    #[serde(default)]
    pub restart_time: i64,

    /// Pending shutdown command deadline (ms)
    #[serde(default)]
    pub shutdown_time: i64,
}

impl Device {
    /// Create a freshly registered device, unlocked as of `now`
    pub fn new(address: Address, name: String, position: Position, now: i64) -> Self {
        Self {
            address,
            lock_after: now,
            position,
            name,
            short_name: None,
            last_online: 0,
            show_time: 0,
            restart_time: 0,
            shutdown_time: 0,
        }
    }

    pub fn with_short_name(mut self, short_name: Option<String>) -> Self {
        self.short_name = short_name;
        self
    }

    /// Whether the device had polled within `timeout_secs`
    pub fn is_online(&self, now: i64, timeout_secs: i64) -> bool {
        (now.saturating_sub(self.last_online) as f64 / 1000.0) < timeout_secs as f64
    }
}

/// Request to register a device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    pub address: String,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub short_name: Option<String>,
}

/// Partial device update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUpdate {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl DeviceUpdate {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.name.is_none()
            && self.position.is_none()
            && self.short_name.is_none()
    }
}

/// One-shot command toggles; `true` arms a command, `false` clears it
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeviceCommands {
    #[serde(default)]
    pub time: Option<bool>,
    #[serde(default)]
    pub restart: Option<bool>,
    #[serde(default)]
    pub shutdown: Option<bool>,
}

impl DeviceCommands {
    pub fn is_empty(&self) -> bool {
        self.time.is_none() && self.restart.is_none() && self.shutdown.is_none()
    }
}
