#![no_main]

use libfuzzer_sys::fuzz_target;
use islandclash::zone::{BlockPos, Vertex, Zone};

fuzz_target!(|data: &[u8]| {
    let coords: Vec<i32> = data
        .chunks_exact(2)
        .map(|pair| i32::from(i16::from_le_bytes([pair[0], pair[1]])))
        .collect();
    let Some((probe, rest)) = coords.split_first_chunk::<3>() else {
        return;
    };

    let vertices = rest
        .chunks_exact(2)
        .map(|xz| Vertex::new(xz[0], xz[1]))
        .collect();
    if let Ok(zone) = Zone::new(vertices, -64, 320) {
        let _ = zone.contains(BlockPos::new(probe[0], probe[1], probe[2]));
    }
});
