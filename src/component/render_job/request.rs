use crate::component::composition::{ComposeRequest, VisualItem, VisualSource, validate_job_id};
use crate::component::subtitle_track::WordTiming;
use crate::config::FrameSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 工作檔格式，不認得的欄位直接拒絕
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobRequest {
    #[serde(default)]
    pub job_id: Option<String>,
    pub narration: PathBuf,
    #[serde(default)]
    pub narration_duration: Option<f64>,
    pub script: String,
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub word_alignment: Option<Vec<WordTiming>>,
    pub visual: VisualRequest,
    /// 主要素材失敗時改用的主題
    #[serde(default)]
    pub fallback_theme: Option<String>,
    pub output: PathBuf,
    #[serde(default)]
    pub frame: Option<FrameSettings>,
}

/// 三選一：單一背景影片、主題背景庫、素材串接
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualRequest {
    Background(PathBuf),
    Theme(String),
    Segments(Vec<SegmentRequest>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SegmentRequest {
    pub path: PathBuf,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default, rename = "loop")]
    pub looped: bool,
}

impl JobRequest {
    /// 讀取工作檔，相對路徑以工作檔所在資料夾為基準
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取工作檔: {}", path.display()))?;
        let mut request: Self = serde_json::from_str(&content)
            .with_context(|| format!("工作檔格式錯誤: {}", path.display()))?;
        if let Some(job_id) = &request.job_id {
            validate_job_id(job_id)
                .with_context(|| format!("工作檔格式錯誤: {}", path.display()))?;
        }

        if let Some(base) = path.parent() {
            request.resolve_paths(base);
        }
        Ok(request)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        resolve(&mut self.narration);
        resolve(&mut self.output);
        match &mut self.visual {
            VisualRequest::Background(path) => resolve(path),
            VisualRequest::Segments(segments) => {
                for segment in segments {
                    resolve(&mut segment.path);
                }
            }
            VisualRequest::Theme(_) => {}
        }
    }

    /// 轉成合成管線的輸入，主題需由呼叫端先解析成實際影片
    #[must_use]
    pub fn to_compose_request(&self, job_id: &str, visual: VisualSource) -> ComposeRequest {
        ComposeRequest {
            job_id: Some(job_id.to_string()),
            narration: self.narration.clone(),
            narration_duration: self.narration_duration,
            script: self.script.clone(),
            hook: self.hook.clone(),
            word_alignment: self.word_alignment.clone(),
            visual,
            output: self.output.clone(),
            frame: self.frame,
        }
    }
}

impl From<&SegmentRequest> for VisualItem {
    fn from(segment: &SegmentRequest) -> Self {
        Self {
            path: segment.path.clone(),
            duration: segment.duration,
            force_loop: segment.looped,
        }
    }
}
