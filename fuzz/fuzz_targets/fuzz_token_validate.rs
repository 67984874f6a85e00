#![no_main]

use libfuzzer_sys::fuzz_target;
use netlock_core::token;

fuzz_target!(|data: &[u8]| {
    // Arbitrary tokens are rejected, never a panic
    let candidate = String::from_utf8_lossy(data);
    assert!(token::decode_expiry(&candidate, "fuzz-secret").is_none());
    assert!(!token::validate(&candidate, "fuzz-secret", 0));
});
