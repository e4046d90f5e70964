//! Fuzz target: `SystemConfig::from_json`
//!
//! Arbitrary bytes must either be rejected or yield a config that passes
//! its own validation.  Never panics.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;

use kitchenguard::config::SystemConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SystemConfig::from_json(text) {
        assert!(config.validate().is_ok());
    }
});
