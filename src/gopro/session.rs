//! GoPro recording session. Lists the clips that belong
//! to one recording session, in recording order.
//!
//! GoPro splits long recordings into clips of ~4 GB,
//! e.g. `GH010026.MP4`, `GH020026.MP4`, `GH030026.MP4`.
//! The order of the clips is set by the caller and is never changed.

use std::path::PathBuf;

use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, warn};

use crate::{
    errors::Error,
    files::{basename, collect_inputs},
    timeline::{merge, MergeOptions, TelemetryTimeline},
};

/// Merged telemetry for a session, plus the clips that could not be read.
#[derive(Debug)]
pub struct Batch {
    pub timeline: TelemetryTimeline,
    /// Clips that failed, with the reason.
    pub failures: Vec<(PathBuf, Error)>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GoProSession(Vec<PathBuf>);

impl GoProSession {
    /// Session from clips in recording order.
    pub fn new(paths: &[PathBuf]) -> Self {
        Self(paths.to_owned())
    }

    /// Session from files and/or directories. Directories are searched
    /// for MP4/LRV clips, sorted by path, which matches GoPro's
    /// file naming for consecutive clips.
    pub fn from_inputs(inputs: &[PathBuf]) -> Self {
        Self(collect_inputs(inputs))
    }

    /// Number of clips in session.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if session contains no clips.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.iter()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.0
    }

    /// Derive 'basename' for session from first clip in session.
    /// E.g. if session contains `GH010026.MP4, GH020026.MP4, GH030026.MP4`,
    /// `GH010026` will be returned.
    pub fn basename(&self) -> Option<String> {
        self.0.first().map(|p| basename(p))
    }

    /// Extracts telemetry for all clips in parallel.
    /// Results are in session order, regardless of completion order.
    pub fn timelines(&self, progress: &ProgressBar) -> Vec<Result<TelemetryTimeline, Error>> {
        progress.set_length(self.len() as u64);
        self.0
            .par_iter()
            .progress_with(progress.to_owned())
            .map(|path| crate::extract(path))
            .collect()
    }

    /// Extracts and merges telemetry for all clips.
    /// Clips that fail are reported in `Batch::failures`.
    /// Fails only if no clip could be read.
    pub fn merge(&self, options: &MergeOptions) -> Result<Batch, Error> {
        self.merge_with_progress(options, &ProgressBar::hidden())
    }

    /// Same as `merge()`, reporting progress per clip.
    pub fn merge_with_progress(&self, options: &MergeOptions, progress: &ProgressBar) -> Result<Batch, Error> {
        let mut timelines = Vec::new();
        let mut failures = Vec::new();

        for (path, result) in self.0.iter().zip(self.timelines(progress)) {
            match result {
                Ok(timeline) => timelines.push(timeline),
                Err(err) => {
                    warn!("Skipping {}: {err}", path.display());
                    failures.push((path.to_owned(), err));
                }
            }
        }
        progress.finish_and_clear();

        info!("Merging {} of {} clips", timelines.len(), self.len());
        let timeline = merge(timelines, options).ok_or(Error::NoTelemetry)?;

        Ok(Batch { timeline, failures })
    }
}
