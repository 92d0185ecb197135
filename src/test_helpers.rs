//! Synthetic GPMF and MP4 data for unit and integration tests.

use std::path::{Path, PathBuf};

/// Single KLV block. `rows` are the raw big endian samples,
/// each `size` bytes. Pads to 32-bit alignment.
pub fn klv<T: AsRef<[u8]>>(fourcc: &[u8; 4], value_type: u8, size: u8, rows: &[T]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend(fourcc);
    bytes.push(value_type);
    bytes.push(size);
    bytes.extend((rows.len() as u16).to_be_bytes());
    for row in rows {
        bytes.extend(row.as_ref());
    }
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
}

/// Nested KLV block. Children are already aligned.
pub fn nested(fourcc: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let data = children.concat();
    let mut bytes = Vec::new();
    bytes.extend(fourcc);
    bytes.push(0);
    bytes.push(4);
    bytes.extend(((data.len() / 4) as u16).to_be_bytes());
    bytes.extend(data);
    bytes
}

/// `c` type string, one byte per repeat.
pub fn text(fourcc: &[u8; 4], value: &str) -> Vec<u8> {
    let rows: Vec<&[u8]> = value.as_bytes().chunks(1).collect();
    klv(fourcc, b'c', 1, &rows)
}

pub fn scal(divisors: &[i32]) -> Vec<u8> {
    let rows: Vec<[u8; 4]> = divisors.iter().map(|d| d.to_be_bytes()).collect();
    klv(b"SCAL", b'l', 4, &rows)
}

pub fn gpsf(fix: u32) -> Vec<u8> {
    klv(b"GPSF", b'L', 4, &[fix.to_be_bytes()])
}

/// DOP x 100
pub fn gpsp(dop: u16) -> Vec<u8> {
    klv(b"GPSP", b'S', 2, &[dop.to_be_bytes()])
}

/// `yymmddhhmmss.sss`
pub fn gpsu(datetime: &str) -> Vec<u8> {
    klv(b"GPSU", b'U', 16, &[datetime.as_bytes()])
}

pub fn gps5(rows: &[[i32; 5]]) -> Vec<u8> {
    let rows: Vec<Vec<u8>> = rows
        .iter()
        .map(|r| r.iter().flat_map(|v| v.to_be_bytes()).collect())
        .collect();
    klv(b"GPS5", b'l', 20, &rows)
}

/// GPS9 rows as `lllllllSS`: lat, lon, alt, speed 2D, speed 3D,
/// days since 2000, seconds since midnight (ms), DOP x 100, fix.
pub fn gps9(rows: &[([i32; 7], [u16; 2])]) -> Vec<u8> {
    let rows: Vec<Vec<u8>> = rows
        .iter()
        .map(|(l, s)| {
            l.iter()
                .flat_map(|v| v.to_be_bytes())
                .chain(s.iter().flat_map(|v| v.to_be_bytes()))
                .collect()
        })
        .collect();
    klv(b"GPS9", b'?', 32, &rows)
}

/// 3-axis `s` type sensor data, e.g. `ACCL`.
pub fn vector3(fourcc: &[u8; 4], rows: &[[i16; 3]]) -> Vec<u8> {
    let rows: Vec<Vec<u8>> = rows
        .iter()
        .map(|r| r.iter().flat_map(|v| v.to_be_bytes()).collect())
        .collect();
    klv(fourcc, b's', 6, &rows)
}

pub fn strm(blocks: &[Vec<u8>]) -> Vec<u8> {
    nested(b"STRM", blocks)
}

/// `DEVC` with device name and streams.
pub fn devc(device: &str, streams: &[Vec<u8>]) -> Vec<u8> {
    let mut children = vec![
        klv(b"DVID", b'L', 4, &[1_u32.to_be_bytes()]),
        text(b"DVNM", device),
    ];
    children.extend(streams.iter().cloned());
    nested(b"DEVC", &children)
}

/// GPS5 payload with 1e7 lat/lon scale, 3D fix.
pub fn gps5_payload(rows: &[[i32; 5]], datetime: &str) -> Vec<u8> {
    devc(
        "Hero9 Black",
        &[strm(&[
            text(b"STNM", "GPS (Lat., Long., Alt., 2D speed, 3D speed)"),
            gpsf(3),
            gpsu(datetime),
            gpsp(150),
            scal(&[10_000_000, 10_000_000, 1000, 1000, 100]),
            gps5(rows),
        ])],
    )
}

/// Full MP4 atom.
pub fn atom(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend((data.len() as u32 + 8).to_be_bytes());
    bytes.extend(name);
    bytes.extend(data);
    bytes
}

fn full_atom(name: &[u8; 4], data: &[u8]) -> Vec<u8> {
    atom(name, &[&[0_u8; 4][..], data].concat())
}

/// Minimal MP4 with `ftyp`, `mdat` with the payloads, and `moov`
/// with a single `GoPro MET` track, one sample per chunk.
pub fn mp4_with_payloads(payloads: &[Vec<u8>], timescale: u32, delta: u32) -> Vec<u8> {
    let ftyp = atom(b"ftyp", b"mp41\0\0\0\0mp41");
    let mdat = atom(b"mdat", &payloads.concat());

    let mut chunk_offsets = Vec::new();
    let mut pos = (ftyp.len() + 8) as u32;
    for p in payloads {
        chunk_offsets.push(pos);
        pos += p.len() as u32;
    }
    let count = payloads.len() as u32;

    let mdhd = full_atom(
        b"mdhd",
        &[
            &0_u32.to_be_bytes()[..],
            &0_u32.to_be_bytes()[..],
            &timescale.to_be_bytes()[..],
            &(count * delta).to_be_bytes()[..],
            &[0_u8; 4][..],
        ]
        .concat(),
    );
    let hdlr = full_atom(
        b"hdlr",
        &[&[0_u8; 4][..], &b"meta"[..], &[0_u8; 12][..], &b"\tGoPro MET"[..]].concat(),
    );
    let stsd = full_atom(
        b"stsd",
        &[&1_u32.to_be_bytes()[..], &16_u32.to_be_bytes()[..], &b"gpmd"[..], &[0_u8; 8][..]].concat(),
    );
    let stts = if count == 0 {
        full_atom(b"stts", &0_u32.to_be_bytes())
    } else {
        full_atom(
            b"stts",
            &[1_u32.to_be_bytes(), count.to_be_bytes(), delta.to_be_bytes()].concat(),
        )
    };
    let stsz = full_atom(
        b"stsz",
        &[
            0_u32.to_be_bytes().to_vec(),
            count.to_be_bytes().to_vec(),
            payloads
                .iter()
                .flat_map(|p| (p.len() as u32).to_be_bytes())
                .collect(),
        ]
        .concat(),
    );
    let stsc = full_atom(
        b"stsc",
        &[1_u32.to_be_bytes(), 1_u32.to_be_bytes(), 1_u32.to_be_bytes(), 1_u32.to_be_bytes()].concat(),
    );
    let stco = full_atom(
        b"stco",
        &[
            count.to_be_bytes().to_vec(),
            chunk_offsets.iter().flat_map(|o| o.to_be_bytes()).collect(),
        ]
        .concat(),
    );

    let stbl = atom(b"stbl", &[stsd, stts, stsz, stsc, stco].concat());
    let minf = atom(b"minf", &[full_atom(b"nmhd", &[]), stbl].concat());
    let mdia = atom(b"mdia", &[mdhd, hdlr, minf].concat());
    let moov = atom(b"moov", &atom(b"trak", &mdia));

    [ftyp, mdat, moov].concat()
}

/// Writes an MP4 with the payloads to `dir/name`, 1 s per payload.
pub fn write_mp4(dir: &Path, name: &str, payloads: &[Vec<u8>]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, mp4_with_payloads(payloads, 1000, 1000)).unwrap();
    path
}

/// `count` GPS5 rows at 1e7 scale, latitude stepping by `step` raw units.
pub fn gps_rows(count: usize, lat: i32, lon: i32, step: i32) -> Vec<[i32; 5]> {
    (0..count as i32)
        .map(|i| [lat + i * step, lon, 100_000, 1500, 1600])
        .collect()
}
