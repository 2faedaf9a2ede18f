#![no_main]

use libfuzzer_sys::fuzz_target;
use islandclash::persistence::TerritoriesDocument;

fuzz_target!(|data: &[u8]| {
    if let Ok(doc) = serde_json::from_slice::<TerritoriesDocument>(data) {
        for (id, record) in doc {
            let _ = record.into_island(id);
        }
    }
});
