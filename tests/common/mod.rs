//! Raw GPMF files for integration tests.

use std::path::{Path, PathBuf};

#[allow(dead_code)]
#[path = "../../src/test_helpers.rs"]
mod builders;

use builders::{devc, gps5, gps_rows, gpsf, gpsp, gpsu, scal, strm, vector3};

/// One second of 10 Hz `GPS5` plus 20 Hz `ACCL`, as a single `DEVC`.
/// Latitude steps by 1e-6 degrees per point.
pub fn payload(second: u32, lat: i32) -> Vec<u8> {
    devc(
        "Hero9 Black",
        &[
            strm(&[
                gpsf(3),
                gpsu(&format!("2304120830{:02}.000", 15 + second)),
                gpsp(150),
                scal(&[10_000_000, 10_000_000, 1000, 1000, 100]),
                gps5(&gps_rows(10, lat, 132_000_000, 10)),
            ]),
            strm(&[scal(&[418]), vector3(b"ACCL", &[[4180, 0, 0]; 20])]),
        ],
    )
}

/// Writes a raw GPMF file with `seconds` payloads starting at `lat`.
pub fn write_gpmf(dir: &Path, name: &str, seconds: u32, lat: i32) -> PathBuf {
    let bytes: Vec<u8> = (0..seconds).flat_map(|s| payload(s, lat + s as i32 * 100)).collect();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
