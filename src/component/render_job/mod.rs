//! 工作執行元件
//!
//! 讀取工作檔、解析主題背景、失敗時改用備援主題，並輸出結果檔

mod outcome;
mod request;
mod runner;

pub use outcome::{JobOutcome, JobStatus};
pub use request::{JobRequest, SegmentRequest, VisualRequest};
pub use runner::{JobRunner, outcome_path_for};
