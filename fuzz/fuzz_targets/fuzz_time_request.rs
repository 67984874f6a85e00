#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use netlock_core::{compute_lock_after, TimeRequest};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    body: &'a str,
    current: i64,
    now: i64,
}

fuzz_target!(|input: Input| {
    // Arbitrary JSON bodies must parse or fail cleanly
    let Ok(request) = serde_json::from_str::<TimeRequest>(input.body) else {
        return;
    };

    if let Ok(change) = request.parse() {
        // Saturating arithmetic, never panics
        let result = compute_lock_after(input.current, input.now, change);
        assert_eq!(result.kind, change.kind());
        if change.delta_ms == 0 {
            assert_eq!(result.lock_after, input.now);
        }
    }
});
