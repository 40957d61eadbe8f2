use crate::component::composition::ComposeReport;
use crate::error::ComposeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Completed,
    Failed,
}

/// 單一工作的結果，寫成 `<job>.outcome.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_strategy: Option<String>,
    #[serde(default)]
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_dir: Option<PathBuf>,
}

impl JobOutcome {
    #[must_use]
    pub fn completed(report: &ComposeReport, used_fallback: bool) -> Self {
        Self {
            job_id: report.job_id.clone(),
            status: JobStatus::Completed,
            output_path: Some(report.output_path.clone()),
            visual_strategy: Some(report.visual_plan.describe()),
            used_fallback,
            error_kind: None,
            reason: None,
            diagnostics: None,
            debug_dir: report.debug_dir.clone(),
        }
    }

    #[must_use]
    pub fn failed(job_id: &str, error: &ComposeError) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            output_path: None,
            visual_strategy: None,
            used_fallback: false,
            error_kind: Some(error.kind().to_string()),
            reason: Some(error.to_string()),
            diagnostics: error.diagnostics().map(ToString::to_string),
            debug_dir: None,
        }
    }

    /// 工作檔本身無法解析
    #[must_use]
    pub fn invalid_request(job_id: &str, error: &anyhow::Error) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: JobStatus::Failed,
            output_path: None,
            visual_strategy: None,
            used_fallback: false,
            error_kind: Some("invalid_request".to_string()),
            reason: Some(format!("{error:#}")),
            diagnostics: None,
            debug_dir: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Completed
    }
}
