//! Host network interface discovery
//!
//! Seeds the admin address set with the hardware addresses of the machine
//! the daemon runs on, so the host itself is an admin on first start.

use std::path::Path;
use tracing::{debug, warn};

use netlock_core::{normalize_all, Address};

/// Sysfs directory listing network interfaces
const SYS_CLASS_NET: &str = "/sys/class/net";

/// Address reported by loopback and virtual interfaces
const NULL_ADDRESS: &str = "000000000000";

/// Hardware addresses of the local interfaces
pub fn local_addresses() -> Vec<Address> {
    addresses_in(Path::new(SYS_CLASS_NET))
}

/// Hardware addresses of the interfaces listed under `root`, in name order,
/// without duplicates and without null or invalid addresses
pub fn addresses_in(root: &Path) -> Vec<Address> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list network interfaces in {:?}: {}", root, e);
            return Vec::new();
        }
    };

    let mut names: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    names.sort();

    let raws: Vec<String> = names
        .iter()
        .filter_map(|dir| std::fs::read_to_string(dir.join("address")).ok())
        .map(|raw| raw.trim().to_string())
        .collect();

    let keep = |address: &Address| address.is_valid() && address.as_str() != NULL_ADDRESS;
    let mut addresses = normalize_all(raws, Some(&keep));
    let mut seen = Vec::with_capacity(addresses.len());
    addresses.retain(|a| {
        if seen.contains(a) {
            false
        } else {
            seen.push(a.clone());
            true
        }
    });

    debug!("Found {} interface addresses", addresses.len());
    addresses
}
