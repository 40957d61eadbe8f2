//! 合成管線元件
//!
//! 將字幕軌與視覺計畫組成單一轉碼工作並執行

mod debug_artifacts;
mod filter_graph;
mod job;
mod pipeline;
mod render_plan;

pub use debug_artifacts::{DebugArtifacts, ProbeRecord};
pub use filter_graph::{escape_filter_path, format_seconds};
pub use job::{
    ComposeRequest, CompositionJob, NarrationTrack, VisualItem, VisualSource, validate_job_id,
};
pub use pipeline::{ComposeReport, Composer};
pub use render_plan::{InputSpec, RenderPlan};
