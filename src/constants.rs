use time::{macros::datetime, Duration, PrimitiveDateTime};

/// GPS9 dates are logged as days since this date.
pub const GPMF_DATETIME_DEFAULT: PrimitiveDateTime = datetime!(2000-1-1 0:0:0);
/// `hdlr` atom handler name for the GPMF track.
pub const GOPRO_METADATA_HANDLER: &str = "GoPro MET";
/// `hdlr` handler subtype for timed metadata tracks.
pub const MP4_METADATA_HANDLER_TYPE: &[u8; 4] = b"meta";
/// `stsd` sample format for GPMF tracks.
pub const GPMF_SAMPLE_FORMAT: &[u8; 4] = b"gpmd";
/// Max nesting for GPMF KLV containers.
/// GoPro devices use 2-3 levels (`DEVC` > `STRM` > values).
pub const MAX_KLV_DEPTH: usize = 8;
/// Max nesting for MP4 atoms.
pub const MAX_ATOM_DEPTH: usize = 16;
/// Max in-memory size for "raw" GPMF files, e.g. extracted via FFmpeg.
pub const MAX_RAW_GPMF_SIZE: u64 = 50_000_000;
/// Payload duration assumed for raw GPMF files (no MP4 timing available).
/// GoPro devices write one `DEVC` per second.
pub const RAW_PAYLOAD_DURATION_MS: i64 = 1000;
/// Max absolute `TIMO` value. GoPro devices log offsets in the
/// millisecond range, larger values are treated as corrupt.
pub const MAX_TIME_OFFSET: Duration = Duration::DAY;
/// Default time gap that starts a new GPX track segment.
pub const DEFAULT_GPX_SEGMENT_GAP_SECS: f64 = 5.0;
/// Default distance between consecutive clips that suggests a missing clip.
pub const DEFAULT_MERGE_GAP_THRESHOLD_M: f64 = 500.0;
/// Default output file naming pattern.
pub const DEFAULT_NAMING_PATTERN: &str = "{name}_{kind}.{ext}";
/// Default basename for merged multi-clip exports.
pub const DEFAULT_MERGED_NAME: &str = "merged_track";
/// Default output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "telemetry_output";
/// Mean earth radius in metres, for haversine distances.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;
