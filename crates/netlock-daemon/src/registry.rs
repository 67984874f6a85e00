//! Registry actor
//!
//! Owns the settings document. Every operation runs inside one critical
//! section: the document is cloned, the core transition is applied to the
//! clone, the clone is persisted, and only then committed to memory. A failed
//! transition or a failed persist leaves the in-memory document unchanged.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use zeroize::Zeroizing;

use netlock_core::{
    overview, token, validate_password, Address, AdminSettings, AdminSettingsUpdate, Clock,
    Device, DeviceCommands, DeviceUpdate, LockChange, LockOverview, LockStatus, LoginOutcome,
    NewDevice, Settings, TimeChange,
};

use crate::error::{DaemonError, Result};
use crate::store::SettingsStore;

/// Serializes all reads and writes of the settings document
pub struct Registry {
    document: Mutex<Settings>,
    store: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl Registry {
    /// Load the stored document, or persist `seed` when nothing is stored yet
    pub fn open(store: Arc<dyn SettingsStore>, clock: Arc<dyn Clock>, seed: Settings) -> Result<Self> {
        let document = match store.load()? {
            Some(settings) => {
                info!(
                    "Loaded settings: {} devices, {} admin addresses",
                    settings.devices.len(),
                    settings.admin_addresses.len()
                );
                settings
            }
            None => {
                store.save(&seed)?;
                info!(
                    "Initialized settings with {} admin addresses",
                    seed.admin_addresses.len()
                );
                seed
            }
        };

        Ok(Self {
            document: Mutex::new(document),
            store,
            clock,
        })
    }

    async fn read<T>(&self, f: impl FnOnce(&Settings, i64) -> T) -> T {
        let document = self.document.lock().await;
        f(&document, self.clock.now_ms())
    }

    async fn write<T>(
        &self,
        f: impl FnOnce(&mut Settings, i64) -> netlock_core::Result<T>,
    ) -> Result<T> {
        let mut document = self.document.lock().await;
        let mut draft = document.clone();
        let value = f(&mut draft, self.clock.now_ms())?;
        self.store.save(&draft)?;
        *document = draft;
        Ok(value)
    }

    /// Run key derivation off the async workers
    async fn blocking<T, F>(f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| DaemonError::Crypto(format!("Key derivation task failed: {}", e)))
    }

    /// Copy of the whole document
    pub async fn snapshot(&self) -> Settings {
        self.document.lock().await.clone()
    }

    // ---------------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------------

    /// Evaluate a device's lock and record that it polled
    pub async fn device_status(&self, address: &Address) -> Result<LockStatus> {
        let status = self.write(|s, now| s.poll_device(address, now)).await?;
        debug!("Status for {}: locked={}", address, status.is_locked);
        Ok(status)
    }

    pub async fn overview(&self) -> LockOverview {
        self.read(|s, now| overview(&s.devices, s.device_timeout, now))
            .await
    }

    pub async fn set_lock(&self, address: &Address, change: TimeChange) -> Result<LockChange> {
        let result = self.write(|s, now| s.set_lock(address, change, now)).await?;
        info!("{} for {} (lock after {})", result.kind, address, result.lock_after);
        Ok(result)
    }

    /// Open the global time-info window, returning its end
    pub async fn force_time_info(&self) -> Result<i64> {
        let till = self.write(|s, now| Ok(s.force_time_info(now))).await?;
        info!("Time info shown until {}", till);
        Ok(till)
    }

    pub async fn set_commands(&self, address: &Address, commands: DeviceCommands) -> Result<Device> {
        let device = self
            .write(|s, now| s.set_commands(address, commands, now).cloned())
            .await?;
        info!("Commands set for {}: {:?}", address, commands);
        Ok(device)
    }

    // ---------------------------------------------------------------------
    // Devices
    // ---------------------------------------------------------------------

    pub async fn devices(&self) -> Vec<Device> {
        self.read(|s, _| s.devices.clone()).await
    }

    pub async fn device(&self, address: &Address) -> Result<Device> {
        self.read(|s, _| {
            s.device(address)
                .cloned()
                .ok_or_else(|| netlock_core::Error::DeviceNotFound(address.clone()))
        })
        .await
        .map_err(Into::into)
    }

    pub async fn add_device(&self, request: NewDevice) -> Result<Device> {
        let device = self
            .write(|s, now| s.add_device(request, now).cloned())
            .await?;
        info!("Added device {} at {}", device.address, device.position);
        Ok(device)
    }

    pub async fn update_device(&self, address: &Address, update: DeviceUpdate) -> Result<Device> {
        let device = self
            .write(|s, _| s.update_device(address, update).cloned())
            .await?;
        info!("Updated device {}", address);
        Ok(device)
    }

    pub async fn remove_device(&self, address: &Address) -> Result<Device> {
        let device = self.write(|s, _| s.remove_device(address)).await?;
        info!("Removed device {}", address);
        Ok(device)
    }

    // ---------------------------------------------------------------------
    // Admin addresses
    // ---------------------------------------------------------------------

    pub async fn admin_addresses(&self) -> Vec<Address> {
        self.read(|s, _| s.admin_addresses.clone()).await
    }

    pub async fn add_admin_address(&self, raw: &str) -> Result<Address> {
        let address = self.write(|s, _| s.add_admin_address(raw)).await?;
        info!("Added admin address {}", address);
        Ok(address)
    }

    pub async fn remove_admin_address(&self, address: &Address) -> Result<()> {
        self.write(|s, _| s.remove_admin_address(address)).await?;
        info!("Removed admin address {}", address);
        Ok(())
    }

    pub async fn is_admin_any(&self, addresses: &[Address]) -> bool {
        self.read(|s, _| s.is_admin_any(addresses)).await
    }

    // ---------------------------------------------------------------------
    // Sessions and admin settings
    // ---------------------------------------------------------------------

    /// Exchange a password for a token.
    ///
    /// The token is derived outside the critical section. The document is
    /// only persisted when the password is adopted as the first admin
    /// password.
    pub async fn login(&self, password: &str) -> Result<LoginOutcome> {
        validate_password(password)?;

        let (stored, cache_secs, now) = self
            .read(|s, now| {
                let stored = s.admin_password.clone().map(Zeroizing::new);
                (stored, s.admin_password_cache_time, now)
            })
            .await;
        if stored.as_ref().is_some_and(|secret| secret.as_str() != password) {
            return Ok(LoginOutcome::Rejected);
        }

        let secret = Zeroizing::new(password.to_string());
        let token = Self::blocking(move || token::issue(&secret, now, cache_secs)).await??;
        if stored.is_some() {
            return Ok(LoginOutcome::Issued { token, bootstrapped: false });
        }

        // Another login may have set a password in the meantime
        let adopted = self
            .write(|s, _| {
                let current = s.admin_password.get_or_insert_with(|| password.to_string());
                Ok(current.as_str() == password)
            })
            .await?;
        if !adopted {
            return Ok(LoginOutcome::Rejected);
        }

        info!("Admin password set on first login");
        Ok(LoginOutcome::Issued { token, bootstrapped: true })
    }

    /// Validate a token against the current password, outside the critical section
    pub async fn check_token(&self, token: &str) -> Result<bool> {
        let (secret, now) = self
            .read(|s, now| (s.admin_password.clone().map(Zeroizing::new), now))
            .await;
        let secret = secret.ok_or(netlock_core::Error::NoAdminPasswordSet)?;

        let token = token.to_string();
        Self::blocking(move || token::validate(&token, &secret, now)).await
    }

    pub async fn change_password(&self, password: &str) -> Result<()> {
        self.write(|s, _| s.change_password(password)).await?;
        info!("Admin password changed");
        Ok(())
    }

    pub async fn admin_settings(&self) -> AdminSettings {
        self.read(|s, _| s.admin_settings()).await
    }

    pub async fn update_admin_settings(&self, update: AdminSettingsUpdate) -> Result<AdminSettings> {
        let settings = self
            .write(|s, _| {
                s.update_admin_settings(update)?;
                Ok(s.admin_settings())
            })
            .await?;
        info!("Admin settings updated: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DaemonError;
    use crate::store::MemoryStore;
    use netlock_core::{ManualClock, Position};

    const NOW: i64 = 1_700_000_000_000;

    fn registry() -> (Registry, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let seed = Settings::seeded(vec![Address::normalize("AABBCCDDEEFF")], None);
        let registry = Registry::open(store.clone(), clock.clone(), seed).unwrap();
        (registry, store, clock)
    }

    fn new_device(address: &str, x: i64) -> NewDevice {
        NewDevice {
            address: address.to_string(),
            name: "Desk".to_string(),
            position: Position(x, 0),
            short_name: None,
        }
    }

    #[tokio::test]
    async fn test_open_persists_seed() {
        let (_registry, store, _) = registry();
        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.admin_addresses, vec![Address::normalize("AABBCCDDEEFF")]);
    }

    #[tokio::test]
    async fn test_open_prefers_stored_document() {
        let stored = Settings::seeded(vec![Address::normalize("112233445566")], None);
        let store = Arc::new(MemoryStore::with_settings(stored.clone()));
        let clock = Arc::new(ManualClock::new(NOW));

        let registry = Registry::open(store, clock, Settings::default()).unwrap();
        assert_eq!(registry.snapshot().await, stored);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let (registry, store, _) = registry();
        registry.add_device(new_device("11:22:33:44:55:66", 1)).await.unwrap();

        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.devices.len(), 1);
        assert_eq!(stored, registry.snapshot().await);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_state_intact() {
        let (registry, store, _) = registry();
        let address = registry
            .add_device(new_device("112233445566", 1))
            .await
            .unwrap()
            .address;
        let before = registry.snapshot().await;

        store.set_fail_writes(true);
        let result = registry.set_lock(&address, TimeChange::set(60_000)).await;
        assert!(matches!(result, Err(DaemonError::Store(_))));
        assert_eq!(registry.snapshot().await, before);

        // Retry succeeds once the store recovers
        store.set_fail_writes(false);
        let change = registry.set_lock(&address, TimeChange::set(60_000)).await.unwrap();
        assert_eq!(change.lock_after, NOW + 60_000);
    }

    #[tokio::test]
    async fn test_rejected_transition_is_not_persisted() {
        let (registry, store, _) = registry();
        let result = registry.remove_device(&Address::normalize("112233445566")).await;
        assert!(matches!(
            result,
            Err(DaemonError::Core(netlock_core::Error::DeviceNotFound(_)))
        ));
        assert!(store.load().unwrap().unwrap().devices.is_empty());
    }

    #[tokio::test]
    async fn test_status_stamps_last_online() {
        let (registry, _, clock) = registry();
        let address = registry
            .add_device(new_device("112233445566", 1))
            .await
            .unwrap()
            .address;

        clock.advance(5_000);
        let status = registry.device_status(&address).await.unwrap();
        assert!(status.is_locked);
        assert_eq!(registry.device(&address).await.unwrap().last_online, NOW + 5_000);

        let overview = registry.overview().await;
        assert!(overview.online[0].is_online);
    }

    #[tokio::test]
    async fn test_login_bootstraps_once() {
        let (registry, store, _) = registry();

        let first = registry.login("secret").await.unwrap();
        assert!(matches!(first, LoginOutcome::Issued { bootstrapped: true, .. }));
        assert_eq!(
            store.load().unwrap().unwrap().admin_password.as_deref(),
            Some("secret")
        );

        let second = registry.login("other").await.unwrap();
        assert_eq!(second, LoginOutcome::Rejected);
    }

    #[tokio::test]
    async fn test_check_token_tracks_password() {
        let (registry, _, clock) = registry();
        assert!(matches!(
            registry.check_token("anything").await,
            Err(DaemonError::Core(netlock_core::Error::NoAdminPasswordSet))
        ));

        let token = match registry.login("secret").await.unwrap() {
            LoginOutcome::Issued { token, .. } => token,
            LoginOutcome::Rejected => panic!("expected a token"),
        };
        assert!(registry.check_token(token.as_str()).await.unwrap());

        // Checks and polls proceed while another check is in flight
        let address = registry
            .add_device(new_device("112233445566", 1))
            .await
            .unwrap()
            .address;
        let (valid, status) = tokio::join!(
            registry.check_token(token.as_str()),
            registry.device_status(&address)
        );
        assert!(valid.unwrap());
        assert!(status.is_ok());

        clock.advance(3_601_000);
        assert!(!registry.check_token(token.as_str()).await.unwrap());
    }

    #[tokio::test]
    async fn test_login_rejects_surrounding_whitespace() {
        let (registry, store, _) = registry();
        let result = registry.login(" secret").await;
        assert!(matches!(
            result,
            Err(DaemonError::Core(netlock_core::Error::PasswordWhitespace))
        ));
        assert!(store.load().unwrap().unwrap().admin_password.is_none());
    }

    #[tokio::test]
    async fn test_admin_settings_update() {
        let (registry, _, _) = registry();
        let updated = registry
            .update_admin_settings(AdminSettingsUpdate {
                reminder_time: Some(60),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.reminder_time, 60);
        assert_eq!(registry.admin_settings().await, updated);
    }
}
