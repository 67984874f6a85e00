//! Lock status evaluation
//!
//! Derives what a polling device should display from its lock expiry, its
//! pending one-shot commands and the global reminder policy. Pure: stamping
//! `lastOnline` is the registry's job.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::device::Device;

/// Global reminder/display policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayPolicy {
    /// Reminder window before lock (seconds)
    pub reminder_time: i64,
    /// How long the reminder stays up once shown (seconds)
    pub show_time_info_duration: i64,
    /// Forced reminder deadline (ms)
    pub show_time_info_till: i64,
}

/// Externally visible status of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    pub lock_after: i64,
    pub is_locked: bool,
    pub request_time: i64,
    pub remaining_seconds: i64,
    pub time_info: bool,
    pub restart: bool,
    pub shutdown: bool,
}

/// Whole seconds until `lock_after`, rounded, never negative
pub fn remaining_seconds(lock_after: i64, now: i64) -> i64 {
    if now >= lock_after {
        return 0;
    }
    let remaining = (lock_after.saturating_sub(now) as f64 / 1000.0).round() as i64;
    remaining.max(0)
}

/// Evaluate a device's status at `now`
pub fn evaluate(device: &Device, policy: &DisplayPolicy, now: i64) -> LockStatus {
    let lock_after = device.lock_after;
    let remaining = remaining_seconds(lock_after, now);
    let is_locked = now >= lock_after;

    let forced = policy.show_time_info_till > now && remaining > 0;
    let remind_after = remaining < policy.reminder_time;
    let end_remind =
        remaining < policy.reminder_time.saturating_sub(policy.show_time_info_duration);
    let in_window = !is_locked && remind_after && !end_remind;

    LockStatus {
        lock_after,
        is_locked,
        request_time: now,
        remaining_seconds: remaining,
        time_info: in_window || forced || now < device.show_time,
        restart: now < device.restart_time,
        shutdown: now < device.shutdown_time,
    }
}

/// Lock flag of one device in the overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLock {
    pub address: Address,
    pub is_locked: bool,
}

/// Liveness flag of one device in the overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceOnline {
    pub address: Address,
    pub is_online: bool,
}

/// Lock and liveness state of every device with a lock timestamp
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOverview {
    pub locks: Vec<DeviceLock>,
    pub online: Vec<DeviceOnline>,
}

pub fn overview(devices: &[Device], device_timeout: i64, now: i64) -> LockOverview {
    let tracked: Vec<&Device> = devices.iter().filter(|d| d.lock_after > 0).collect();

    LockOverview {
        locks: tracked
            .iter()
            .map(|d| DeviceLock {
                address: d.address.clone(),
                is_locked: now >= d.lock_after,
            })
            .collect(),
        online: tracked
            .iter()
            .map(|d| DeviceOnline {
                address: d.address.clone(),
                is_online: d.is_online(now, device_timeout),
            })
            .collect(),
    }
}
