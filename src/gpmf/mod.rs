//! Core GPMF structures: FourCC, KLV blocks, value decoding, and timing.

pub mod fourcc;
pub mod gpmf;
pub mod klv;
pub mod timestamp;
pub mod value;

pub use fourcc::FourCC;
pub use gpmf::{fingerprint, Gpmf, GpmfPayload};
pub use klv::{BlockData, KlvHeader, RawMetadataBlock};
pub use timestamp::Timestamp;
pub use value::Values;
