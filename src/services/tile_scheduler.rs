//! Cooperative tiled processing.
//!
//! The scheduler walks a [`TilePlan`] in raster order. For each tile it
//! crops a standalone buffer, hands it to the processing function, writes
//! the result back at the tile offset, reports progress, then yields to the
//! runtime before touching the next tile. A stale [`RenderToken`] stops the
//! job at the next yield point; the partially stitched buffer is dropped.

use std::sync::Arc;

use dither_engine::{DitherError, PixelBuffer, Tile, TilePlan};

use crate::error::RenderError;
use crate::services::perf::{measure, PerformanceRecorder};
use crate::services::render_token::RenderToken;

/// Result of a cancellable job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome<T> {
    /// Every step ran and the token was still current at the end.
    Completed(T),
    /// The token went stale; `completed` steps had finished.
    Cancelled { completed: usize },
}

impl<T> JobOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled { .. })
    }

    /// The finished value, if the job completed.
    pub fn completed(self) -> Option<T> {
        match self {
            JobOutcome::Completed(value) => Some(value),
            JobOutcome::Cancelled { .. } => None,
        }
    }
}

/// Progress report for one finished tile.
#[derive(Debug)]
pub struct TileProgress<'a> {
    pub tile: Tile,
    /// The processed tile, before it is stitched in.
    pub partial: &'a PixelBuffer,
}

/// Splits buffers into tiles and processes them one at a time.
#[derive(Debug, Clone, Default)]
pub struct TileScheduler {
    tile_size: Option<u32>,
    recorder: Option<Arc<PerformanceRecorder>>,
}

impl TileScheduler {
    /// Scheduler choosing tile sizes from the buffer's pixel count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a fixed tile edge regardless of buffer size.
    pub fn with_tile_size(mut self, size: u32) -> Self {
        self.tile_size = Some(size.max(1));
        self
    }

    /// Report per-tile timings into `recorder`.
    pub fn with_recorder(mut self, recorder: Arc<PerformanceRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// The plan this scheduler would use for a `width x height` buffer.
    pub fn plan(&self, width: u32, height: u32) -> TilePlan {
        match self.tile_size {
            Some(size) if width > size || height > size => {
                TilePlan::with_tile_size(width, height, size)
            }
            Some(_) => TilePlan::whole(width, height),
            None => TilePlan::for_dimensions(width, height),
        }
    }

    /// Process `buffer` tile by tile.
    ///
    /// `process` must return a buffer of the same size as the tile it was
    /// given. `on_tile` is called once per finished tile, in raster order,
    /// and never again after the token goes stale.
    pub async fn run<F, P>(
        &self,
        buffer: &PixelBuffer,
        token: &RenderToken,
        mut process: F,
        mut on_tile: P,
    ) -> Result<JobOutcome<PixelBuffer>, RenderError>
    where
        F: FnMut(&PixelBuffer) -> Result<PixelBuffer, DitherError>,
        P: FnMut(TileProgress<'_>),
    {
        if !token.is_current() {
            tracing::debug!(token = token.id(), "Job stale before first tile");
            return Ok(JobOutcome::Cancelled { completed: 0 });
        }

        let (width, height) = buffer.dimensions();
        let plan = self.plan(width, height);
        tracing::debug!(
            width,
            height,
            tiles = plan.len(),
            tile_size = plan.tile_size().0,
            "Tile plan chosen"
        );

        let mut output = buffer.clone();
        for tile in plan.tiles() {
            let partial = measure(self.recorder.as_deref(), "tile", || {
                process(&buffer.crop(&tile))
            })?;
            if partial.dimensions() != (tile.width, tile.height) {
                return Err(DitherError::TileMismatch {
                    index: tile.index,
                    width: tile.width,
                    height: tile.height,
                    actual_width: partial.width(),
                    actual_height: partial.height(),
                }
                .into());
            }
            output.blit(&tile, &partial)?;
            on_tile(TileProgress {
                tile,
                partial: &partial,
            });

            tokio::task::yield_now().await;

            if !token.is_current() {
                tracing::info!(
                    token = token.id(),
                    completed = tile.index + 1,
                    total = tile.total,
                    "Tiled job cancelled"
                );
                return Ok(JobOutcome::Cancelled {
                    completed: tile.index + 1,
                });
            }
        }

        Ok(JobOutcome::Completed(output))
    }
}
