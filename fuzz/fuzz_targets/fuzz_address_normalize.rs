#![no_main]

use libfuzzer_sys::fuzz_target;
use netlock_core::address::{is_valid_address, parse_address_list, Address};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    // Normalization is idempotent and only yields uppercase alphanumerics
    let address = Address::normalize(&raw);
    assert_eq!(Address::normalize(address.as_str()), address);
    assert!(address
        .as_str()
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    assert_eq!(address.is_valid(), is_valid_address(address.as_str()));

    // Parsing accepts exactly the valid normal forms
    match Address::parse(&raw) {
        Ok(parsed) => assert!(parsed.is_valid()),
        Err(_) => assert!(!address.is_valid()),
    }

    // Header lists never yield invalid entries
    if let Ok(list) = parse_address_list(&raw) {
        assert!(!list.is_empty());
        assert!(list.iter().all(Address::is_valid));
    }
});
