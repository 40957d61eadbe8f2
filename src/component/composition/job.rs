use crate::component::subtitle_track::{SubtitleTrack, WordTiming};
use crate::component::visual_reconciler::VisualPlan;
use crate::config::FrameSettings;
use crate::error::{ComposeError, ComposeResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// job_id 會成為中間檔目錄、除錯目錄與佔位影片的名稱，只允許單層的檔名
pub fn validate_job_id(job_id: &str) -> ComposeResult<()> {
    let invalid = job_id.is_empty()
        || job_id == "."
        || job_id.contains("..")
        || Path::new(job_id).is_absolute()
        || job_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\'') || c.is_control());

    if invalid {
        return Err(ComposeError::Planning(format!("job_id 無效: {job_id:?}")));
    }
    Ok(())
}

/// 視覺素材的指定方式（主題已在上層解析成實際路徑）
#[derive(Debug, Clone, PartialEq)]
pub enum VisualSource {
    Background(PathBuf),
    Segments(Vec<VisualItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisualItem {
    pub path: PathBuf,
    /// 權重（秒），未指定時平均分配
    pub duration: Option<f64>,
    pub force_loop: bool,
}

impl VisualItem {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration: None,
            force_loop: false,
        }
    }
}

/// 一次合成所需的全部輸入
#[derive(Debug, Clone)]
pub struct ComposeRequest {
    /// 決定中間檔目錄名稱；未指定時自動產生
    pub job_id: Option<String>,
    pub narration: PathBuf,
    /// 已知的旁白長度，未提供時以 probe 取得
    pub narration_duration: Option<f64>,
    pub script: String,
    pub hook: Option<String>,
    pub word_alignment: Option<Vec<WordTiming>>,
    pub visual: VisualSource,
    pub output: PathBuf,
    pub frame: Option<FrameSettings>,
}

impl ComposeRequest {
    #[must_use]
    pub fn new(
        narration: impl Into<PathBuf>,
        script: impl Into<String>,
        visual: VisualSource,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            job_id: None,
            narration: narration.into(),
            narration_duration: None,
            script: script.into(),
            hook: None,
            word_alignment: None,
            visual,
            output: output.into(),
            frame: None,
        }
    }
}

/// 已取得長度的旁白音檔
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrationTrack {
    pub path: PathBuf,
    pub duration: f64,
}

/// 規劃完成、等待轉碼的工作
///
/// 由 [`super::Composer`] 建立後只會被轉成一次 [`super::RenderPlan`]
#[derive(Debug)]
pub struct CompositionJob {
    pub job_id: String,
    pub narration: NarrationTrack,
    pub subtitle_track: SubtitleTrack,
    pub subtitle_path: PathBuf,
    pub visual_plan: VisualPlan,
    pub frame: FrameSettings,
    pub output_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_job_id() {
        for id in ["story", "job_01", "story_fallback", "2024-05-01.v2"] {
            assert!(validate_job_id(id).is_ok(), "{id}");
        }
        for id in ["", ".", "..", "../victim", "a/b", "a\\b", "/", "/tmp/x", "it's", "a\nb"] {
            let error = validate_job_id(id).unwrap_err();
            assert_eq!(error.kind(), "planning_failure", "{id:?}");
        }
    }
}
