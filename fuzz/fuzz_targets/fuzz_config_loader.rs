#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use islandclash::config::ConfigLoader;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        let loader = ConfigLoader::with_defaults();
        if let Ok(loaded) = loader.load_from_str(yaml_str, Path::new("fuzz.yaml")) {
            // A validated config must always convert to engine settings
            assert!(loaded.config.game_settings().is_ok());
        }
    }
});
