//! Fuzz target: stored configuration record
//!
//! Feeds arbitrary bytes to the forgiving decoder and the strict setup
//! parser, verifying:
//! - No panics under arbitrary byte inputs
//! - `decode` always yields a config that passes validation
//! - Whatever the strict parser accepts re-encodes to the same config
//!
//! cargo fuzz run fuzz_config_record

#![no_main]

use corvid::config::{self, BirdConfig, ConfigRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cfg = config::decode(data);
    assert!(cfg.validate().is_ok(), "decode produced invalid config: {cfg:?}");

    if let Ok(record) = serde_json::from_slice::<ConfigRecord>(data) {
        if let Ok(strict) = BirdConfig::from_record(&record) {
            let bytes = serde_json::to_vec(&strict.to_record()).expect("record serialises");
            let back = config::decode(&bytes);
            assert_eq!(back.earliest, strict.earliest);
            assert_eq!(back.latest, strict.latest);
            assert_eq!(back.interval_minutes, strict.interval_minutes);
            assert_eq!(back.mode, strict.mode);
        }
    }
});
