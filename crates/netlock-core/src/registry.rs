//! Device and admin registry transitions
//!
//! Every operation validates first and mutates last, so a rejected call
//! leaves the document untouched.

use crate::address::Address;
use crate::device::{Device, DeviceCommands, DeviceUpdate, NewDevice, Position};
use crate::error::{Error, Result};
use crate::lock::{compute_lock_after, LockChange, TimeChange};
use crate::settings::{AdminSettingsUpdate, Settings};
use crate::status::{evaluate, LockStatus};
use crate::token::{self, Token};

/// Result of a password login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Password accepted; `bootstrapped` is set when it was just adopted
    Issued { token: Token, bootstrapped: bool },
    /// Password did not match
    Rejected,
}

/// Check that a password can be presented again through a header.
///
/// Header values lose surrounding whitespace in transit, so such a
/// password could never be used to log in.
pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(Error::NoPasswordProvided);
    }
    if password.trim() != password {
        return Err(Error::PasswordWhitespace);
    }
    Ok(())
}

impl Settings {
    fn position_taken(&self, position: Position, except: Option<&Address>) -> bool {
        self.devices
            .iter()
            .any(|d| d.position == position && Some(&d.address) != except)
    }

    /// Register a new device, unlocked as of `now`
    pub fn add_device(&mut self, request: NewDevice, now: i64) -> Result<&Device> {
        let address = Address::parse(&request.address)?;
        if request.name.trim().is_empty() {
            return Err(Error::MissingField("name"));
        }
        if self.device(&address).is_some() {
            return Err(Error::AddressAlreadyExists(address));
        }
        if self.position_taken(request.position, None) {
            return Err(Error::PositionTaken(request.position));
        }

        let device = Device::new(address, request.name, request.position, now)
            .with_short_name(request.short_name);
        self.devices.push(device);
        Ok(&self.devices[self.devices.len() - 1])
    }

    /// Apply a partial update, possibly re-addressing the device
    pub fn update_device(&mut self, address: &Address, update: DeviceUpdate) -> Result<&Device> {
        if self.device(address).is_none() {
            return Err(Error::DeviceNotFound(address.clone()));
        }

        let new_address = match update.address.as_deref().filter(|a| !a.is_empty()) {
            Some(raw) => {
                let parsed = Address::parse(raw)?;
                if &parsed != address && self.device(&parsed).is_some() {
                    return Err(Error::AddressAlreadyExists(parsed));
                }
                Some(parsed)
            }
            None => None,
        };
        if let Some(position) = update.position {
            if self.position_taken(position, Some(address)) {
                return Err(Error::PositionTaken(position));
            }
        }

        let device = self
            .device_mut(address)
            .ok_or_else(|| Error::DeviceNotFound(address.clone()))?;
        if let Some(new_address) = new_address {
            device.address = new_address;
        }
        if let Some(name) = update.name {
            device.name = name;
        }
        if let Some(position) = update.position {
            device.position = position;
        }
        if update.short_name.is_some() {
            device.short_name = update.short_name;
        }
        Ok(device)
    }

    pub fn remove_device(&mut self, address: &Address) -> Result<Device> {
        let index = self
            .devices
            .iter()
            .position(|d| &d.address == address)
            .ok_or_else(|| Error::DeviceNotFound(address.clone()))?;
        Ok(self.devices.remove(index))
    }

    /// Apply a lock-time change to a device
    pub fn set_lock(&mut self, address: &Address, change: TimeChange, now: i64) -> Result<LockChange> {
        let device = self
            .device_mut(address)
            .ok_or_else(|| Error::DeviceNotFound(address.clone()))?;
        let result = compute_lock_after(device.lock_after, now, change);
        device.lock_after = result.lock_after;
        Ok(result)
    }

    /// Evaluate a device's status and stamp its `lastOnline`
    pub fn poll_device(&mut self, address: &Address, now: i64) -> Result<LockStatus> {
        let policy = self.display_policy();
        let device = self
            .device_mut(address)
            .ok_or_else(|| Error::DeviceNotFound(address.clone()))?;
        let status = evaluate(device, &policy, now);
        device.last_online = now;
        Ok(status)
    }

    /// Show the reminder on every unlocked device for the configured duration
    pub fn force_time_info(&mut self, now: i64) -> i64 {
        self.show_time_info_till = now.saturating_add(self.show_time_info_ms());
        self.show_time_info_till
    }

    /// Arm or clear one-shot commands on a device
    pub fn set_commands(&mut self, address: &Address, commands: DeviceCommands, now: i64) -> Result<&Device> {
        if commands.is_empty() {
            return Err(Error::NoCommandProvided);
        }
        let deadline = now.saturating_add(self.show_time_info_ms());
        let device = self
            .device_mut(address)
            .ok_or_else(|| Error::DeviceNotFound(address.clone()))?;

        let arm = |flag: bool| if flag { deadline } else { 0 };
        if let Some(flag) = commands.time {
            device.show_time = arm(flag);
        }
        if let Some(flag) = commands.restart {
            device.restart_time = arm(flag);
        }
        if let Some(flag) = commands.shutdown {
            device.shutdown_time = arm(flag);
        }
        Ok(device)
    }

    pub fn add_admin_address(&mut self, raw: &str) -> Result<Address> {
        let address = Address::parse(raw)?;
        if self.admin_addresses.contains(&address) {
            return Err(Error::AdminAddressExists(address));
        }
        self.admin_addresses.push(address.clone());
        Ok(address)
    }

    /// Remove an admin address; the set may never become empty
    pub fn remove_admin_address(&mut self, address: &Address) -> Result<()> {
        let index = self
            .admin_addresses
            .iter()
            .position(|a| a == address)
            .ok_or_else(|| Error::AdminAddressNotFound(address.clone()))?;
        if self.admin_addresses.len() == 1 {
            return Err(Error::CannotRemoveLastAdmin);
        }
        self.admin_addresses.remove(index);
        Ok(())
    }

    /// Whether any of the caller's addresses is an admin address
    pub fn is_admin_any(&self, addresses: &[Address]) -> bool {
        addresses.iter().any(|a| self.admin_addresses.contains(a))
    }

    pub fn update_admin_settings(&mut self, update: AdminSettingsUpdate) -> Result<()> {
        if update.admin_password_cache_time.is_none() && update.reminder_time.is_none() {
            return Err(Error::NoSettingProvided);
        }
        for value in [update.admin_password_cache_time, update.reminder_time]
            .into_iter()
            .flatten()
        {
            if value < 0 {
                return Err(Error::InvalidTime(value.to_string()));
            }
        }
        if let Some(secs) = update.admin_password_cache_time {
            self.admin_password_cache_time = secs;
        }
        if let Some(secs) = update.reminder_time {
            self.reminder_time = secs;
        }
        Ok(())
    }

    /// Exchange the admin password for a token.
    ///
    /// With no password configured yet, the presented one is adopted.
    pub fn login(&mut self, password: &str, now: i64) -> Result<LoginOutcome> {
        validate_password(password)?;

        let bootstrapped = self.admin_password.is_none();
        let secret = self.admin_password.get_or_insert_with(|| password.to_string());
        if secret.as_str() != password {
            return Ok(LoginOutcome::Rejected);
        }

        let token = token::issue(secret, now, self.admin_password_cache_time)?;
        Ok(LoginOutcome::Issued { token, bootstrapped })
    }

    /// Validate a presented token against the current password
    pub fn check_token(&self, token: &str, now: i64) -> Result<bool> {
        let secret = self
            .admin_password
            .as_deref()
            .ok_or(Error::NoAdminPasswordSet)?;
        Ok(token::validate(token, secret, now))
    }

    pub fn change_password(&mut self, password: &str) -> Result<()> {
        validate_password(password)?;
        if self.admin_password.as_deref() == Some(password) {
            return Err(Error::SamePassword);
        }
        self.admin_password = Some(password.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn new_device(address: &str, x: i64, y: i64) -> NewDevice {
        NewDevice {
            address: address.to_string(),
            name: format!("Device {}", address),
            position: Position(x, y),
            short_name: None,
        }
    }

    fn addr(raw: &str) -> Address {
        Address::normalize(raw)
    }

    #[test]
    fn test_add_device_initial_state() {
        let mut settings = Settings::default();
        let device = settings.add_device(new_device("aa:bb:cc:dd:ee:ff", 0, 0), NOW).unwrap();
        assert_eq!(device.lock_after, NOW);
        assert_eq!(device.last_online, 0);
        assert_eq!(device.show_time, 0);
        assert_eq!(device.restart_time, 0);
        assert_eq!(device.shutdown_time, 0);
    }

    #[test]
    fn test_add_device_conflicts() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 1, 1), NOW).unwrap();

        assert_eq!(
            settings.add_device(new_device("aa-bb-cc-dd-ee-ff", 2, 2), NOW).unwrap_err(),
            Error::AddressAlreadyExists(addr("AABBCCDDEEFF"))
        );
        assert_eq!(
            settings.add_device(new_device("112233445566", 1, 1), NOW).unwrap_err(),
            Error::PositionTaken(Position(1, 1))
        );
        assert!(matches!(
            settings.add_device(new_device("nope", 3, 3), NOW),
            Err(Error::InvalidAddress(_))
        ));
        assert_eq!(settings.devices.len(), 1);
    }

    #[test]
    fn test_update_device() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 0, 0), NOW).unwrap();
        settings.add_device(new_device("112233445566", 1, 0), NOW).unwrap();

        let update = DeviceUpdate {
            address: Some("aa:bb:cc:00:00:01".to_string()),
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let device = settings.update_device(&addr("AABBCCDDEEFF"), update).unwrap();
        assert_eq!(device.address, addr("AABBCC000001"));
        assert_eq!(device.name, "Renamed");
        assert_eq!(device.position, Position(0, 0));

        let clash = DeviceUpdate {
            position: Some(Position(1, 0)),
            ..Default::default()
        };
        assert_eq!(
            settings.update_device(&addr("AABBCC000001"), clash).unwrap_err(),
            Error::PositionTaken(Position(1, 0))
        );

        let steal = DeviceUpdate {
            address: Some("112233445566".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            settings.update_device(&addr("AABBCC000001"), steal),
            Err(Error::AddressAlreadyExists(_))
        ));

        assert!(matches!(
            settings.update_device(&addr("FFFFFFFFFFFF"), DeviceUpdate::default()),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_update_keeps_own_position() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 4, 4), NOW).unwrap();
        let update = DeviceUpdate {
            position: Some(Position(4, 4)),
            ..Default::default()
        };
        assert!(settings.update_device(&addr("AABBCCDDEEFF"), update).is_ok());
    }

    #[test]
    fn test_remove_device() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 0, 0), NOW).unwrap();
        assert!(settings.remove_device(&addr("AABBCCDDEEFF")).is_ok());
        assert!(matches!(
            settings.remove_device(&addr("AABBCCDDEEFF")),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_set_lock_and_poll() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 0, 0), NOW).unwrap();
        let a = addr("AABBCCDDEEFF");

        let change = settings.set_lock(&a, TimeChange::set(600_000), NOW).unwrap();
        assert_eq!(change.lock_after, NOW + 600_000);

        let status = settings.poll_device(&a, NOW + 1_000).unwrap();
        assert_eq!(status.remaining_seconds, 599);
        assert_eq!(settings.device(&a).unwrap().last_online, NOW + 1_000);

        assert!(matches!(
            settings.set_lock(&addr("112233445566"), TimeChange::set(1), NOW),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn test_commands() {
        let mut settings = Settings::default();
        settings.add_device(new_device("AABBCCDDEEFF", 0, 0), NOW).unwrap();
        let a = addr("AABBCCDDEEFF");

        let commands = DeviceCommands {
            restart: Some(true),
            shutdown: Some(false),
            ..Default::default()
        };
        let device = settings.set_commands(&a, commands, NOW).unwrap();
        assert_eq!(device.restart_time, NOW + 10_000);
        assert_eq!(device.shutdown_time, 0);
        assert_eq!(device.show_time, 0);

        assert_eq!(
            settings.set_commands(&a, DeviceCommands::default(), NOW).unwrap_err(),
            Error::NoCommandProvided
        );
    }

    #[test]
    fn test_force_time_info() {
        let mut settings = Settings::default();
        assert_eq!(settings.force_time_info(NOW), NOW + 10_000);
        assert_eq!(settings.show_time_info_till, NOW + 10_000);
    }

    #[test]
    fn test_admin_addresses() {
        let mut settings = Settings::default();
        settings.add_admin_address("aa:bb:cc:dd:ee:ff").unwrap();
        assert!(matches!(
            settings.add_admin_address("AABBCCDDEEFF"),
            Err(Error::AdminAddressExists(_))
        ));
        assert_eq!(
            settings.remove_admin_address(&addr("AABBCCDDEEFF")).unwrap_err(),
            Error::CannotRemoveLastAdmin
        );

        settings.add_admin_address("112233445566").unwrap();
        assert!(settings.is_admin_any(&[addr("112233445566")]));
        settings.remove_admin_address(&addr("AABBCCDDEEFF")).unwrap();
        assert!(!settings.is_admin_any(&[addr("AABBCCDDEEFF")]));
        assert!(matches!(
            settings.remove_admin_address(&addr("AABBCCDDEEFF")),
            Err(Error::AdminAddressNotFound(_))
        ));
    }

    #[test]
    fn test_admin_settings_update() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.update_admin_settings(AdminSettingsUpdate::default()).unwrap_err(),
            Error::NoSettingProvided
        );
        settings
            .update_admin_settings(AdminSettingsUpdate {
                reminder_time: Some(120),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(settings.reminder_time, 120);
        assert_eq!(settings.admin_password_cache_time, 3600);
    }

    #[test]
    fn test_login_bootstraps_password() {
        let mut settings = Settings::default();
        let outcome = settings.login("first", NOW).unwrap();
        assert!(matches!(outcome, LoginOutcome::Issued { bootstrapped: true, .. }));
        assert_eq!(settings.admin_password.as_deref(), Some("first"));

        assert_eq!(settings.login("second", NOW).unwrap(), LoginOutcome::Rejected);
        assert_eq!(settings.admin_password.as_deref(), Some("first"));

        match settings.login("first", NOW).unwrap() {
            LoginOutcome::Issued { token, bootstrapped } => {
                assert!(!bootstrapped);
                assert!(settings.check_token(token.as_str(), NOW).unwrap());
            }
            LoginOutcome::Rejected => panic!("expected a token"),
        }
    }

    #[test]
    fn test_check_token_requires_password() {
        let settings = Settings::default();
        assert_eq!(settings.check_token("x", NOW), Err(Error::NoAdminPasswordSet));
    }

    #[test]
    fn test_password_change_revokes_tokens() {
        let mut settings = Settings::seeded(Vec::new(), Some("old".to_string()));
        let token = match settings.login("old", NOW).unwrap() {
            LoginOutcome::Issued { token, .. } => token,
            LoginOutcome::Rejected => panic!("expected a token"),
        };

        assert_eq!(settings.change_password("old"), Err(Error::SamePassword));
        assert_eq!(settings.change_password(""), Err(Error::NoPasswordProvided));
        assert_eq!(settings.change_password(" new "), Err(Error::PasswordWhitespace));
        assert_eq!(settings.change_password("new\t"), Err(Error::PasswordWhitespace));
        assert_eq!(settings.admin_password.as_deref(), Some("old"));
        settings.change_password("new").unwrap();
        assert!(!settings.check_token(token.as_str(), NOW).unwrap());
    }
}
