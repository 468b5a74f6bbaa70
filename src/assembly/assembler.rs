//! Training matrix assembly across clips.
//!
//! Clip `i` owns columns `[i·K, (i+1)·K)` where `K` is the patch count,
//! and writes its patches there in draw order. Because the ranges are
//! fixed before any clip runs, clips can be processed on several
//! threads and still produce the same matrix as a sequential run.

use super::{ColumnBlock, MatrixError, TrainingMatrix};
use crate::config::{ClipPolicy, ConfigError, ExtractionConfig};
use crate::metrics::MetricsRegistry;
use crate::sampling::{extract, flatten, ClipSeeds, PatchSampler, SamplingError};
use crate::source::{ClipDeadline, ClipLoader, SourceError};
use crate::volume::{VolumeBuilder, VolumeError};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// The stage-level cause of a clip failure.
#[derive(Debug, Error)]
pub enum ClipFailure {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Volume(#[from] VolumeError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("timed out after {elapsed:?} (limit {limit:?})")]
    Timeout { elapsed: Duration, limit: Duration },
}

fn patch_suffix(patch: &Option<usize>) -> String {
    patch.map(|p| format!(" patch {p}")).unwrap_or_default()
}

/// Errors that can occur while assembling the training matrix.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("no clips to process")]
    NoClips,
    #[error("clip {index} ({}){}: {source}", .path.display(), patch_suffix(.patch))]
    Clip {
        index: usize,
        path: PathBuf,
        patch: Option<usize>,
        #[source]
        source: ClipFailure,
    },
    #[error("every clip failed; first failure: {0}")]
    AllClipsFailed(Box<AssemblyError>),
    #[error("cancelled after {completed} of {total} clips")]
    Cancelled { completed: usize, total: usize },
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Where one clip's patches ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    /// Clip path as listed.
    pub path: PathBuf,
    /// First matrix column holding this clip's patches.
    pub first_column: Option<usize>,
    /// Number of columns written for this clip.
    pub patches: usize,
    /// Failure message if the clip was skipped.
    pub skipped: Option<String>,
}

impl ClipRecord {
    fn extracted(path: &Path, first_column: usize, patches: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            first_column: Some(first_column),
            patches,
            skipped: None,
        }
    }

    fn skipped(path: &Path, reason: String) -> Self {
        Self {
            path: path.to_path_buf(),
            first_column: None,
            patches: 0,
            skipped: Some(reason),
        }
    }
}

/// Result of an assembly run.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// The completed training matrix.
    pub matrix: TrainingMatrix,
    /// Per-clip column layout, in clip order.
    pub clips: Vec<ClipRecord>,
    /// Master seed the per-clip streams were derived from.
    pub master_seed: u64,
}

type Outcome = Option<Result<(), AssemblyError>>;

/// Builds the training matrix from a list of clips.
pub struct Assembler<'a> {
    loader: &'a dyn ClipLoader,
    config: ExtractionConfig,
    cancel: Option<&'a AtomicBool>,
    metrics: Option<&'a MetricsRegistry>,
}

impl<'a> Assembler<'a> {
    /// Creates an assembler reading clips through `loader`.
    pub fn new(loader: &'a dyn ClipLoader, config: ExtractionConfig) -> Self {
        Self {
            loader,
            config,
            cancel: None,
            metrics: None,
        }
    }

    /// Stops before the next clip once `flag` is set.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Reports progress to `metrics`.
    pub fn with_metrics(mut self, metrics: &'a MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Samples every clip and assembles the training matrix.
    ///
    /// Clips are laid out in the order given. Under
    /// [`ClipPolicy::Skip`], failed clips are logged and their columns
    /// dropped; under [`ClipPolicy::Abort`], the failure of the first
    /// failing clip (in list order) is returned.
    pub fn assemble(&self, clips: &[PathBuf]) -> Result<Assembly, AssemblyError> {
        self.config.validate()?;
        if clips.is_empty() {
            return Err(AssemblyError::NoClips);
        }

        let k = self.config.num_patches;
        let rows = self.config.feature_len();
        let seeds = ClipSeeds::new(self.config.seed);
        let mut matrix = TrainingMatrix::new(rows, clips.len() * k);

        if let Some(metrics) = self.metrics {
            metrics.set_feature_length(rows);
        }
        info!(
            clips = clips.len(),
            rows,
            columns = matrix.columns(),
            master_seed = seeds.master(),
            workers = self.config.workers,
            "Assembling training matrix"
        );

        let outcomes = {
            let blocks = matrix.blocks_mut(k);
            if self.config.workers > 1 && clips.len() > 1 {
                self.run_parallel(clips, blocks, seeds)
            } else {
                self.run_sequential(clips, blocks, seeds)
            }
        };

        let mut records = Vec::with_capacity(clips.len());
        let mut kept = Vec::with_capacity(matrix.columns());
        let mut first_error = None;
        let mut attempted = 0;

        for (index, (path, outcome)) in clips.iter().zip(outcomes).enumerate() {
            let Some(result) = outcome else { continue };
            attempted += 1;
            match result {
                Ok(()) => {
                    records.push(ClipRecord::extracted(path, kept.len(), k));
                    kept.extend(index * k..(index + 1) * k);
                }
                Err(error) if self.config.on_clip_error == ClipPolicy::Abort => {
                    return Err(error);
                }
                Err(error) => {
                    warn!(clip = %path.display(), error = %error, "Skipping clip");
                    records.push(ClipRecord::skipped(path, error.to_string()));
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if attempted < clips.len() {
            return Err(AssemblyError::Cancelled {
                completed: kept.len() / k,
                total: clips.len(),
            });
        }
        if kept.is_empty() {
            if let Some(error) = first_error {
                return Err(AssemblyError::AllClipsFailed(Box::new(error)));
            }
        }

        let matrix = if kept.len() == matrix.columns() {
            matrix
        } else {
            matrix.select_columns(&kept)
        };
        matrix.ensure_complete()?;

        info!(
            rows = matrix.rows(),
            columns = matrix.columns(),
            skipped = clips.len() - kept.len() / k,
            "Training matrix complete"
        );

        Ok(Assembly {
            matrix,
            clips: records,
            master_seed: seeds.master(),
        })
    }

    fn run_sequential(
        &self,
        clips: &[PathBuf],
        blocks: Vec<ColumnBlock<'_>>,
        seeds: ClipSeeds,
    ) -> Vec<Outcome> {
        let first_failed = AtomicUsize::new(usize::MAX);
        clips
            .iter()
            .zip(blocks)
            .enumerate()
            .map(|(index, (path, mut block))| {
                self.run_clip(index, path, &mut block, seeds, &first_failed)
            })
            .collect()
    }

    fn run_parallel(
        &self,
        clips: &[PathBuf],
        blocks: Vec<ColumnBlock<'_>>,
        seeds: ClipSeeds,
    ) -> Vec<Outcome> {
        let workers = self.config.workers.min(clips.len());
        let mut queues: Vec<Vec<_>> = (0..workers).map(|_| Vec::new()).collect();
        for (index, (path, block)) in clips.iter().zip(blocks).enumerate() {
            queues[index % workers].push((index, path, block));
        }

        let first_failed = AtomicUsize::new(usize::MAX);
        let mut outcomes: Vec<Outcome> = (0..clips.len()).map(|_| None).collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = queues
                .into_iter()
                .map(|queue| {
                    let first_failed = &first_failed;
                    scope.spawn(move || {
                        queue
                            .into_iter()
                            .map(|(index, path, mut block)| {
                                let outcome =
                                    self.run_clip(index, path, &mut block, seeds, first_failed);
                                (index, outcome)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(results) => {
                        for (index, outcome) in results {
                            outcomes[index] = outcome;
                        }
                    }
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
        });

        outcomes
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Runs one clip unless the run is stopping; `None` means not attempted.
    ///
    /// Under [`ClipPolicy::Abort`], `first_failed` holds the lowest clip
    /// index that failed so far. Clips after it are not attempted;
    /// clips before it still run, so the error returned is always the
    /// first one in list order, whatever the worker count.
    fn run_clip(
        &self,
        index: usize,
        path: &Path,
        block: &mut ColumnBlock<'_>,
        seeds: ClipSeeds,
        first_failed: &AtomicUsize,
    ) -> Outcome {
        if index > first_failed.load(Ordering::SeqCst) || self.is_cancelled() {
            return None;
        }

        let result = self.process_clip(index, path, block, seeds.for_clip(index));
        match &result {
            Ok(()) => {
                if let Some(metrics) = self.metrics {
                    metrics.record_clip_done();
                }
            }
            Err(_) => match self.config.on_clip_error {
                ClipPolicy::Abort => {
                    first_failed.fetch_min(index, Ordering::SeqCst);
                }
                ClipPolicy::Skip => {
                    if let Some(metrics) = self.metrics {
                        metrics.record_clip_skipped(block.filled_count());
                    }
                }
            },
        }
        Some(result)
    }

    fn process_clip(
        &self,
        index: usize,
        path: &Path,
        block: &mut ColumnBlock<'_>,
        mut rng: ChaCha20Rng,
    ) -> Result<(), AssemblyError> {
        let fail = |patch: Option<usize>, source: ClipFailure| AssemblyError::Clip {
            index,
            path: path.to_path_buf(),
            patch,
            source,
        };

        let deadline = self.config.clip_timeout.map(ClipDeadline::start);
        let mut source = self
            .loader
            .open(path)
            .map_err(|e| fail(None, e.into()))?;
        info!(
            clip = %path.display(),
            index,
            frames = source.frame_count(),
            "Loading clip"
        );

        let volume = VolumeBuilder::new(self.config.spatial_size)
            .with_deadline(deadline)
            .load(source.as_mut())
            .map_err(|e| fail(None, e.into()))?;
        drop(source);
        if let Some(metrics) = self.metrics {
            metrics.record_frames(volume.depth());
        }

        let size = self.config.patch_size();
        let sampler = PatchSampler::new(size, self.config.margin);
        let dims = (volume.width(), volume.height(), volume.depth());

        for draw in 0..self.config.num_patches {
            if let Some(deadline) = deadline {
                if let Some(elapsed) = deadline.expired() {
                    let limit = deadline.limit();
                    return Err(fail(Some(draw), ClipFailure::Timeout { elapsed, limit }));
                }
            }
            let anchor = sampler
                .draw(dims, draw, &mut rng)
                .map_err(|e| fail(Some(draw), e.into()))?;
            let patch = extract(&volume, anchor, size).map_err(|e| fail(Some(draw), e.into()))?;
            let vector = flatten(&patch, self.config.packing);
            block
                .set_column(draw, vector.view())
                .map_err(|e| fail(Some(draw), e.into()))?;

            debug!(
                clip = index,
                patch = draw,
                column = block.first_column() + draw,
                x = anchor.x,
                y = anchor.y,
                t = anchor.t,
                "Wrote patch"
            );
            if let Some(metrics) = self.metrics {
                metrics.record_patch();
            }
        }

        Ok(())
    }
}
