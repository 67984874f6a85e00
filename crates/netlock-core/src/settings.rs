//! The process-wide settings document
//!
//! Devices, admin addresses, the admin password and the display policy all
//! live in one document that is read and written whole.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::device::Device;
use crate::status::DisplayPolicy;

/// Application name stamped into new documents
pub const APP_NAME: &str = "network-controller";

/// Default token lifetime (seconds)
pub const DEFAULT_PASSWORD_CACHE_SECS: i64 = 60 * 60;

/// Default length of the pre-lock reminder window (seconds)
pub const DEFAULT_REMINDER_SECS: i64 = 5 * 60;

/// Default time the reminder stays up once shown (seconds)
pub const DEFAULT_SHOW_TIME_INFO_SECS: i64 = 10;

/// Default silence before a device counts as offline (seconds)
pub const DEFAULT_DEVICE_TIMEOUT_SECS: i64 = 30;

/// Persisted settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub app_name: String,

    pub devices: Vec<Device>,

    pub admin_addresses: Vec<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    /// Token lifetime (seconds)
    pub admin_password_cache_time: i64,

    /// Reminder window before lock (seconds)
    pub reminder_time: i64,

    /// How long a reminder stays visible (seconds)
    pub show_time_info_duration: i64,

    /// Forced reminder deadline (ms)
    pub show_time_info_till: i64,

    /// Poll silence before a device is offline (seconds)
    pub device_timeout: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            devices: Vec::new(),
            admin_addresses: Vec::new(),
            admin_password: None,
            admin_password_cache_time: DEFAULT_PASSWORD_CACHE_SECS,
            reminder_time: DEFAULT_REMINDER_SECS,
            show_time_info_duration: DEFAULT_SHOW_TIME_INFO_SECS,
            show_time_info_till: 0,
            device_timeout: DEFAULT_DEVICE_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Fresh document with seeded admin addresses and an optional password
    pub fn seeded(admin_addresses: Vec<Address>, admin_password: Option<String>) -> Self {
        let mut settings = Self::default();
        for address in admin_addresses {
            if !settings.admin_addresses.contains(&address) {
                settings.admin_addresses.push(address);
            }
        }
        settings.admin_password = admin_password.filter(|p| !p.is_empty());
        settings
    }

    /// Reminder/display policy for the status evaluator
    pub fn display_policy(&self) -> DisplayPolicy {
        DisplayPolicy {
            reminder_time: self.reminder_time,
            show_time_info_duration: self.show_time_info_duration,
            show_time_info_till: self.show_time_info_till,
        }
    }

    /// Admin-tunable subset exposed over the API
    pub fn admin_settings(&self) -> AdminSettings {
        AdminSettings {
            admin_password_cache_time: self.admin_password_cache_time,
            reminder_time: self.reminder_time,
        }
    }

    pub fn device(&self, address: &Address) -> Option<&Device> {
        self.devices.iter().find(|d| &d.address == address)
    }

    pub(crate) fn device_mut(&mut self, address: &Address) -> Option<&mut Device> {
        self.devices.iter_mut().find(|d| &d.address == address)
    }

    /// Length of a forced reminder or one-shot command (ms)
    pub(crate) fn show_time_info_ms(&self) -> i64 {
        self.show_time_info_duration.saturating_mul(1000)
    }
}

/// Admin-tunable timings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub admin_password_cache_time: i64,
    pub reminder_time: i64,
}

/// Partial update of [`AdminSettings`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettingsUpdate {
    #[serde(default)]
    pub admin_password_cache_time: Option<i64>,
    #[serde(default)]
    pub reminder_time: Option<i64>,
}
