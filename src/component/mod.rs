//! 功能元件模組
//!
//! 每個子模組實現合成流程的一個階段，包含主要邏輯和專用工具

pub mod caption_timing;
pub mod composition;
pub mod render_job;
pub mod subtitle_track;
pub mod visual_reconciler;

pub use composition::{ComposeReport, ComposeRequest, Composer};
pub use render_job::{JobOutcome, JobRequest, JobRunner};
