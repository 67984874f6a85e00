//! Netlock Core - lock timers, status evaluation and admin sessions
//!
//! This crate holds the pure state machine behind the netlock controller:
//! address normalization, the lock clock, the status evaluator, the
//! encrypted-timestamp admin tokens and the registry transitions over the
//! settings document. Nothing here performs I/O.

pub mod address;
pub mod device;
pub mod error;
pub mod lock;
pub mod registry;
pub mod settings;
pub mod status;
pub mod time;
pub mod token;

pub use address::{is_valid_address, normalize_all, parse_address_list, Address};
pub use device::{Device, DeviceCommands, DeviceUpdate, NewDevice, Position};
pub use error::{Error, Result};
pub use lock::{compute_lock_after, ChangeKind, LockChange, TimeChange, TimeField, TimeRequest};
pub use registry::{validate_password, LoginOutcome};
pub use settings::{AdminSettings, AdminSettingsUpdate, Settings};
pub use status::{evaluate, overview, DisplayPolicy, LockOverview, LockStatus};
pub use time::{Clock, ManualClock, SystemClock};
pub use token::Token;
