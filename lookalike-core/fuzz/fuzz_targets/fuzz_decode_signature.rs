#![no_main]

//! Fuzz target for Signature::decode()
//!
//! Run with: cargo +nightly fuzz run fuzz_decode_signature

use libfuzzer_sys::fuzz_target;
use lookalike_core::Signature;

fuzz_target!(|data: &[u8]| {
    if let Ok(signature) = Signature::decode(data) {
        let roundtrip = Signature::decode(&signature.encode());
        assert_eq!(roundtrip.ok(), Some(signature));
    }
});
