//! Stream demuxer.
//!
//! Walks `DEVC > STRM > values` for each payload and groups data blocks
//! by stream, together with the sticky values in effect for each block.
//!
//! Modifiers apply to all following siblings, and to all following data
//! in later payloads of the same stream, until a new value is logged.
//! E.g. `SCAL` may be logged once per payload, while `ACCL` is
//! logged at 200 Hz.

mod descriptor;
mod sticky;

pub use descriptor::{DataBlock, Scale, StreamDescriptor, StreamKind};
pub use sticky::StickyContext;

use std::collections::{BTreeMap, BTreeSet};

use time::Duration;
use tracing::{debug, warn};

use crate::{
    errors::{StreamDecodeError, Warning},
    gpmf::{Gpmf, GpmfPayload, RawMetadataBlock, Values},
    FourCC, Timestamp,
};

/// Demuxed streams for a single source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demuxed {
    /// `DVNM` for the first device that logged one.
    pub device: Option<String>,
    pub streams: BTreeMap<StreamKind, StreamDescriptor>,
    pub warnings: Vec<Warning>,
}

impl Demuxed {
    pub fn stream(&self, kind: StreamKind) -> Option<&StreamDescriptor> {
        self.streams.get(&kind)
    }

    /// Total number of decoded samples across all streams.
    pub fn sample_count(&self) -> usize {
        self.streams.values().map(|s| s.sample_count()).sum()
    }
}

/// Level in the block walk. Modifiers logged at a level only
/// affect blocks at that level, or further down.
struct Level<'a> {
    blocks: std::slice::Iter<'a, RawMetadataBlock>,
    context: StickyContext,
}

#[derive(Default)]
struct Demuxer {
    /// Effective sticky values per stream, carried across payloads.
    carried: BTreeMap<StreamKind, StickyContext>,
    /// Unsupported streams already warned for.
    unsupported: BTreeSet<String>,
    demuxed: Demuxed,
}

/// Demux all payloads in `gpmf`.
pub fn demux(gpmf: &Gpmf) -> Demuxed {
    let mut demuxer = Demuxer::default();
    for payload in gpmf.iter() {
        demuxer.payload(payload);
    }
    demuxer.demuxed
}

impl Demuxer {
    fn payload(&mut self, payload: &GpmfPayload) {
        let mut stack = vec![Level {
            blocks: payload.blocks.iter(),
            context: StickyContext::default(),
        }];

        while let Some(level) = stack.last_mut() {
            let Some(block) = level.blocks.next() else {
                stack.pop();
                continue;
            };

            let fourcc = block.fourcc();

            if block.header.is_nested() {
                let context = level.context.clone();
                stack.push(Level {
                    blocks: block.children().iter(),
                    context,
                });
                continue;
            }

            if fourcc == FourCC::DVNM {
                if self.demuxed.device.is_none() {
                    self.demuxed.device = Values::decode(block, None).ok().and_then(|v| v.text());
                }
            } else if fourcc.is_sticky() {
                if let Err(reason) = level.context.apply(block) {
                    let fourcc = fourcc.to_string();
                    self.warn(StreamDecodeError::Value { fourcc, reason });
                }
            } else if let Some(kind) = StreamKind::from_fourcc(&fourcc) {
                let context = level.context.clone();
                self.data(kind, block, &context, payload.time);
            } else if !fourcc.is_bookkeeping() && !fourcc.is_invalid() {
                let fourcc = fourcc.to_string();
                if self.unsupported.insert(fourcc.clone()) {
                    self.warn(StreamDecodeError::Unsupported { fourcc });
                }
            }
        }
    }

    /// Registers a data block for `kind`, with `local` sticky values
    /// from the current `STRM` overlaid on those carried over
    /// from earlier payloads.
    fn data(&mut self, kind: StreamKind, block: &RawMetadataBlock, local: &StickyContext, payload_time: Timestamp) {
        let context = match self.carried.get(&kind) {
            Some(carried) => carried.overlay(local),
            None => local.clone(),
        };
        self.carried.insert(kind, context.clone());

        let descriptor = self
            .demuxed
            .streams
            .entry(kind)
            .or_insert_with(|| StreamDescriptor::new(kind));

        if let Some(name) = &context.name {
            descriptor.name = Some(name.to_owned());
        }
        if let Some(units) = context.units() {
            descriptor.units = units.to_owned();
        }
        if context.orientation.is_some() {
            descriptor.orientation = context.orientation;
        }
        if let Some(system) = &context.altitude_system {
            descriptor.altitude_system = Some(system.to_owned());
        }
        descriptor.sticky.extend(context.logged.iter().cloned());
        descriptor.declared_samples += block.header.repeat as usize;

        if block.header.repeat == 0 {
            debug!("{kind} @{}ms: no samples", payload_time.relative_ms());
            return;
        }

        match decode(kind, block, &context) {
            Ok((rows, scale)) => {
                let time = match context.time_offset {
                    Some(offset) => Timestamp {
                        relative: (payload_time.relative - offset).max(Duration::ZERO),
                        ..payload_time
                    },
                    None => payload_time,
                };
                descriptor.blocks.push(DataBlock {
                    time,
                    rows,
                    scale,
                    fix: context.fix,
                    dop: context.dop,
                    datetime: context.datetime,
                    orientation: context.orientation,
                })
            }
            Err(err) => self.warn(err),
        }
    }

    /// Records a warning once per file.
    fn warn(&mut self, err: StreamDecodeError) {
        let warning = Warning::from(err);
        if !self.demuxed.warnings.contains(&warning) {
            warn!("{warning}");
            self.demuxed.warnings.push(warning);
        } else {
            debug!("{warning}");
        }
    }
}

/// Decodes and validates rows for a data block.
fn decode(
    kind: StreamKind,
    block: &RawMetadataBlock,
    context: &StickyContext,
) -> Result<(Vec<Vec<f64>>, Scale), StreamDecodeError> {
    let fourcc = kind.to_string();
    let values = Values::decode(block, context.type_def.as_deref()).map_err(|reason| {
        StreamDecodeError::Value {
            fourcc: fourcc.clone(),
            reason,
        }
    })?;

    let Values::Numeric(rows) = values else {
        return Err(StreamDecodeError::Value {
            fourcc,
            reason: "expected numeric values".to_owned(),
        });
    };

    if let Some(row) = rows.iter().find(|r| r.len() != kind.width()) {
        return Err(StreamDecodeError::Shape {
            fourcc,
            expected: kind.width(),
            got: row.len(),
        });
    }

    let scale = Scale::new(context.scale.as_deref().unwrap_or_default(), kind)?;

    Ok((rows, scale))
}
