pub mod exporter;
pub mod perf;
pub mod render_token;
pub mod tile_scheduler;

pub use exporter::{native_resolution, ExportRequest, FrameProgress, ResolutionExporter};
pub use perf::{PerformanceRecorder, Sample, StageSummary};
pub use render_token::{RenderToken, RenderTokens};
pub use tile_scheduler::{JobOutcome, TileProgress, TileScheduler};
