//! Resolution-preserving export.
//!
//! The interactive preview dithers at a reduced "working resolution". To
//! make an export at any output size look exactly like that preview, the
//! exporter recomputes the pattern at the working resolution and then blows
//! it up with nearest-neighbour sampling, so every working pixel becomes a
//! solid block of output pixels:
//!
//! 1. fit the source's longer edge into the working resolution (never
//!    upscaling) and area-resample into a working buffer
//! 2. optional Gaussian pre-blur of the working buffer
//! 3. tone adjustment, then optional palette extraction
//! 4. dither, through the [`TileScheduler`] when the working buffer spans
//!    several tiles and the strategy is tile-safe at that tile size
//! 5. nearest-neighbour upscale to the target size
//!
//! When the working buffer already has the source's size the resample step
//! is a plain copy, so an export at native size is identical to dithering
//! the source directly.

use std::sync::Arc;

use dither_engine::resample::{gaussian_blur, resample_area, upscale_nearest, working_dimensions};
use dither_engine::{DitherParams, PaletteExtractor, PixelBuffer, ToneAdjustment};

use crate::error::RenderError;
use crate::models::PresetConfig;
use crate::services::perf::{measure, PerformanceRecorder};
use crate::services::render_token::RenderToken;
use crate::services::tile_scheduler::{JobOutcome, TileProgress, TileScheduler};

/// Everything that determines an export's pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub params: DitherParams,
    pub tone: ToneAdjustment,
    /// Longer-edge budget for the working buffer
    pub working_resolution: u32,
    /// Output size; `None` keeps the source size
    pub target: Option<(u32, u32)>,
    /// Gaussian sigma for the working buffer; `0` disables it
    pub pre_blur: f32,
    /// Replace the palette with one extracted from the toned working buffer
    pub extract_palette: Option<usize>,
}

impl ExportRequest {
    pub fn new(params: DitherParams, working_resolution: u32) -> Self {
        Self {
            params,
            tone: ToneAdjustment::default(),
            working_resolution,
            target: None,
            pre_blur: 0.0,
            extract_palette: None,
        }
    }

    /// Request carrying a preset's dither, tone and pre-blur settings.
    pub fn from_preset(preset: &PresetConfig, working_resolution: u32) -> Self {
        Self {
            tone: preset.tone,
            pre_blur: preset.pre_blur,
            ..Self::new(preset.params.clone(), working_resolution)
        }
    }

    pub fn tone(mut self, tone: ToneAdjustment) -> Self {
        self.tone = tone;
        self
    }

    pub fn target(mut self, width: u32, height: u32) -> Self {
        self.target = Some((width, height));
        self
    }

    pub fn pre_blur(mut self, sigma: f32) -> Self {
        self.pre_blur = sigma;
        self
    }

    pub fn extract_palette(mut self, max_colors: usize) -> Self {
        self.extract_palette = Some(max_colors);
        self
    }
}

/// Progress report for one finished frame of a sequence.
#[derive(Debug)]
pub struct FrameProgress<'a> {
    pub index: usize,
    pub total: usize,
    pub frame: &'a PixelBuffer,
}

/// Re-runs tone and dither at the working resolution and upscales.
#[derive(Debug, Clone, Default)]
pub struct ResolutionExporter {
    scheduler: TileScheduler,
    recorder: Option<Arc<PerformanceRecorder>>,
}

impl ResolutionExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `scheduler` for tiled dithering.
    pub fn with_scheduler(mut self, scheduler: TileScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Report stage timings into `recorder`, including the scheduler's.
    pub fn with_recorder(mut self, recorder: Arc<PerformanceRecorder>) -> Self {
        self.scheduler = self.scheduler.with_recorder(recorder.clone());
        self.recorder = Some(recorder);
        self
    }

    fn recorder(&self) -> Option<&PerformanceRecorder> {
        self.recorder.as_deref()
    }

    /// Export one image.
    pub async fn export(
        &self,
        source: &PixelBuffer,
        request: &ExportRequest,
        token: &RenderToken,
    ) -> Result<JobOutcome<PixelBuffer>, RenderError> {
        self.export_with_progress(source, request, token, |_| {})
            .await
    }

    /// Export one image, reporting each dithered tile when tiling engages.
    pub async fn export_with_progress<P>(
        &self,
        source: &PixelBuffer,
        request: &ExportRequest,
        token: &RenderToken,
        on_tile: P,
    ) -> Result<JobOutcome<PixelBuffer>, RenderError>
    where
        P: FnMut(TileProgress<'_>),
    {
        if !token.is_current() {
            return Ok(JobOutcome::Cancelled { completed: 0 });
        }

        let (src_w, src_h) = source.dimensions();
        let (work_w, work_h) = working_dimensions(src_w, src_h, request.working_resolution);
        let (target_w, target_h) = request.target.unwrap_or((src_w, src_h));
        tracing::debug!(
            source = %format!("{src_w}x{src_h}"),
            working = %format!("{work_w}x{work_h}"),
            target = %format!("{target_w}x{target_h}"),
            algorithm = %request.params.algorithm,
            "Export started"
        );

        let mut working = measure(self.recorder(), "resample", || {
            if (work_w, work_h) == (src_w, src_h) {
                source.clone()
            } else {
                resample_area(source, work_w, work_h)
            }
        });
        if request.pre_blur > 0.0 {
            working = measure(self.recorder(), "blur", || {
                gaussian_blur(&working, request.pre_blur)
            });
        }
        measure(self.recorder(), "tone", || request.tone.apply(&mut working));

        let mut params = request.params.clone();
        if let Some(max_colors) = request.extract_palette {
            let extracted = measure(self.recorder(), "palette", || {
                PaletteExtractor::new().max_colors(max_colors).extract(&working)
            });
            match extracted {
                Some(palette) => params.palette = Some(palette),
                None => tracing::warn!("Palette extraction found too few colors, keeping palette"),
            }
        }

        let dithered = match self.dither(&working, &params, token, on_tile).await? {
            JobOutcome::Completed(buffer) => buffer,
            cancelled => return Ok(cancelled),
        };

        let output = measure(self.recorder(), "upscale", || {
            upscale_nearest(&dithered, target_w, target_h)
        });
        tracing::debug!(bytes = output.bytes().len(), "Export finished");
        Ok(JobOutcome::Completed(output))
    }

    async fn dither<P>(
        &self,
        working: &PixelBuffer,
        params: &DitherParams,
        token: &RenderToken,
        on_tile: P,
    ) -> Result<JobOutcome<PixelBuffer>, RenderError>
    where
        P: FnMut(TileProgress<'_>),
    {
        let (width, height) = working.dimensions();
        let plan = self.scheduler.plan(width, height);
        let algorithm = params.algorithm;

        if !plan.is_single() && algorithm.is_tile_safe(params, plan.tile_size().0) {
            tracing::debug!(tiles = plan.len(), %algorithm, "Dithering through tile scheduler");
            return self
                .scheduler
                .run(
                    working,
                    token,
                    |tile| dither_engine::run(tile, params),
                    on_tile,
                )
                .await;
        }

        if !plan.is_single() {
            tracing::debug!(%algorithm, "Strategy is not tile-safe, dithering whole buffer");
        }
        let dithered = measure(self.recorder(), "dither", || {
            dither_engine::run(working, params)
        })?;

        tokio::task::yield_now().await;
        if !token.is_current() {
            tracing::info!(token = token.id(), "Export cancelled");
            return Ok(JobOutcome::Cancelled { completed: 0 });
        }
        Ok(JobOutcome::Completed(dithered))
    }

    /// Export a sequence of frames with the same request.
    ///
    /// Yields between frames and stops once `token` goes stale; `on_frame`
    /// is never called after that.
    pub async fn export_frames<F>(
        &self,
        frames: &[PixelBuffer],
        request: &ExportRequest,
        token: &RenderToken,
        mut on_frame: F,
    ) -> Result<JobOutcome<Vec<PixelBuffer>>, RenderError>
    where
        F: FnMut(FrameProgress<'_>),
    {
        let total = frames.len();
        let mut outputs = Vec::with_capacity(total);
        for (index, frame) in frames.iter().enumerate() {
            let output = match self.export(frame, request, token).await? {
                JobOutcome::Completed(output) => output,
                JobOutcome::Cancelled { .. } => {
                    return Ok(JobOutcome::Cancelled { completed: index });
                }
            };
            on_frame(FrameProgress {
                index,
                total,
                frame: &output,
            });
            outputs.push(output);

            tokio::task::yield_now().await;
            if !token.is_current() {
                tracing::info!(completed = index + 1, total, "Frame export cancelled");
                return Ok(JobOutcome::Cancelled {
                    completed: index + 1,
                });
            }
        }
        Ok(JobOutcome::Completed(outputs))
    }
}

/// Longer-edge budget that keeps `buffer` at its native size.
pub fn native_resolution(buffer: &PixelBuffer) -> u32 {
    buffer.width().max(buffer.height())
}
