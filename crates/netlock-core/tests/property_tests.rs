//! Property-based tests for netlock-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use proptest::prelude::*;
use netlock_core::{
    address::{is_valid_address, Address},
    compute_lock_after, evaluate,
    device::{Device, NewDevice, Position},
    DisplayPolicy, Error, Settings, TimeChange, TimeField, TimeRequest,
};

// ============================================
// Arbitrary Implementations
// ============================================

/// 12 hex characters
fn arb_hex_address() -> impl Strategy<Value = String> {
    "[0-9a-fA-F]{12}"
}

/// A hex address split into pairs joined by a separator
fn arb_separated_address() -> impl Strategy<Value = String> {
    (arb_hex_address(), prop_oneof![Just(":"), Just("-"), Just("."), Just(" "), Just("")])
        .prop_map(|(hex, sep)| {
            hex.as_bytes()
                .chunks(2)
                .map(|pair| String::from_utf8_lossy(pair).into_owned())
                .collect::<Vec<_>>()
                .join(sep)
        })
}

/// Timestamps in a sane ms range (about 1970 to 2250)
fn arb_timestamp() -> impl Strategy<Value = i64> {
    0i64..10_000_000_000_000
}

fn arb_delta() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000
}

fn arb_policy() -> impl Strategy<Value = DisplayPolicy> {
    (0i64..3600, 0i64..600, arb_timestamp()).prop_map(|(reminder, duration, till)| DisplayPolicy {
        reminder_time: reminder,
        show_time_info_duration: duration,
        show_time_info_till: till,
    })
}

fn device_locked_at(lock_after: i64) -> Device {
    let mut device = Device::new(
        Address::normalize("AABBCCDDEEFF"),
        "Device".to_string(),
        Position(0, 0),
        0,
    );
    device.lock_after = lock_after;
    // No command pending at any time
    device.show_time = i64::MIN;
    device.restart_time = i64::MIN;
    device.shutdown_time = i64::MIN;
    device
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // Address Properties
    // ----------------------------------------

    #[test]
    fn normalize_is_idempotent(raw in ".{0,40}") {
        let once = Address::normalize(&raw);
        let twice = Address::normalize(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalized_is_uppercase_alphanumeric(raw in ".{0,40}") {
        let address = Address::normalize(&raw);
        prop_assert!(address
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn separators_do_not_affect_validity(raw in arb_separated_address()) {
        let address = Address::normalize(&raw);
        prop_assert!(address.is_valid());
        prop_assert_eq!(address.as_str().len(), 12);
    }

    #[test]
    fn separators_do_not_affect_identity(hex in arb_hex_address()) {
        let colon = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":");
        prop_assert_eq!(Address::normalize(&hex), Address::normalize(&colon));
    }

    #[test]
    fn short_strings_are_invalid(raw in "[0-9A-F]{0,11}") {
        prop_assert!(!is_valid_address(&raw));
    }

    // ----------------------------------------
    // Lock Clock Properties
    // ----------------------------------------

    #[test]
    fn zero_delta_unlocks_now(current in arb_timestamp(), now in arb_timestamp(), additive in any::<bool>()) {
        let change = TimeChange { delta_ms: 0, additive };
        prop_assert_eq!(compute_lock_after(current, now, change).lock_after, now);
    }

    #[test]
    fn additive_delta_extends_later_bound(current in arb_timestamp(), now in arb_timestamp(), delta in arb_delta()) {
        let result = compute_lock_after(current, now, TimeChange::add(delta));
        prop_assert_eq!(result.lock_after, current.max(now) + delta);
    }

    #[test]
    fn absolute_delta_counts_from_now(current in arb_timestamp(), now in arb_timestamp(), delta in arb_delta()) {
        let result = compute_lock_after(current, now, TimeChange::set(delta));
        prop_assert_eq!(result.lock_after, now + delta);
    }

    #[test]
    fn negative_delta_shortens_current(current in arb_timestamp(), now in arb_timestamp(), delta in arb_delta(), additive in any::<bool>()) {
        let change = TimeChange { delta_ms: -delta, additive };
        prop_assert_eq!(compute_lock_after(current, now, change).lock_after, current - delta);
    }

    #[test]
    fn plus_prefix_selects_additive(minutes in 0u32..10_000) {
        let request = TimeRequest {
            minutes: Some(TimeField::Text(format!("+{}", minutes))),
            ..Default::default()
        };
        let change = request.parse().unwrap();
        prop_assert!(change.additive);
        prop_assert_eq!(change.delta_ms, minutes as i64 * 60_000);
    }

    #[test]
    fn numeric_fields_are_absolute(hours in 0u32..100, seconds in 0u32..100) {
        let request = TimeRequest {
            hours: Some(TimeField::Number(hours as f64)),
            seconds: Some(TimeField::Number(seconds as f64)),
            ..Default::default()
        };
        let change = request.parse().unwrap();
        prop_assert!(!change.additive);
        prop_assert_eq!(change.delta_ms, hours as i64 * 3_600_000 + seconds as i64 * 1000);
    }

    // ----------------------------------------
    // Status Evaluator Properties
    // ----------------------------------------

    #[test]
    fn past_lock_is_locked_with_no_time_left(lock_after in any::<i64>(), elapsed in any::<i64>(), policy in arb_policy()) {
        let now = lock_after.saturating_add(elapsed.saturating_abs());
        let status = evaluate(&device_locked_at(lock_after), &policy, now);
        prop_assert!(status.is_locked);
        prop_assert_eq!(status.remaining_seconds, 0);
        prop_assert!(!status.restart);
        prop_assert!(!status.shutdown);
    }

    #[test]
    fn remaining_seconds_never_negative(lock_after in any::<i64>(), now in any::<i64>(), policy in arb_policy()) {
        let status = evaluate(&device_locked_at(lock_after), &policy, now);
        prop_assert!(status.remaining_seconds >= 0);
        prop_assert_eq!(status.request_time, now);
    }

    // ----------------------------------------
    // Registry Properties
    // ----------------------------------------

    #[test]
    fn occupied_position_rejects_any_address(x in -100i64..100, y in -100i64..100, a in arb_hex_address(), b in arb_hex_address()) {
        prop_assume!(Address::normalize(&a) != Address::normalize(&b));
        let mut settings = Settings::default();
        let first = NewDevice { address: a, name: "A".into(), position: Position(x, y), short_name: None };
        let second = NewDevice { address: b, name: "B".into(), position: Position(x, y), short_name: None };

        settings.add_device(first, 0).unwrap();
        prop_assert_eq!(settings.add_device(second, 0).unwrap_err(), Error::PositionTaken(Position(x, y)));
        prop_assert_eq!(settings.devices.len(), 1);
    }

    #[test]
    fn last_admin_is_never_removed(hex in arb_hex_address()) {
        let mut settings = Settings::default();
        let address = settings.add_admin_address(&hex).unwrap();
        prop_assert_eq!(settings.remove_admin_address(&address).unwrap_err(), Error::CannotRemoveLastAdmin);
        prop_assert_eq!(settings.admin_addresses.len(), 1);
    }
}
