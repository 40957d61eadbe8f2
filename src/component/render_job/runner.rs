use super::outcome::JobOutcome;
use super::request::{JobRequest, VisualRequest};
use crate::component::composition::{
    Composer, RenderPlan, VisualItem, VisualSource, validate_job_id,
};
use crate::error::{ComposeError, ComposeResult};
use crate::tools::{Transcoder, ensure_directory_exists, scan_video_files};
use anyhow::{Context, Result};
use log::{error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// 主題解析的結果
struct ResolvedVisual {
    source: VisualSource,
    /// 工作結束後要刪除的佔位影片
    placeholder: Option<PathBuf>,
}

/// 工作執行器：解析主題、處理備援、輸出結果檔
pub struct JobRunner<T: Transcoder> {
    composer: Composer<T>,
}

impl<T: Transcoder> JobRunner<T> {
    pub const fn new(composer: Composer<T>) -> Self {
        Self { composer }
    }

    #[must_use]
    pub const fn composer(&self) -> &Composer<T> {
        &self.composer
    }

    /// 執行單一工作；失敗時改用 `fallback_theme` 重試一次
    pub fn run_request(&self, job_id: &str, request: &JobRequest) -> JobOutcome {
        if let Err(e) = validate_job_id(job_id) {
            error!("{e}");
            return JobOutcome::failed(job_id, &e);
        }

        let primary = self.compose_with(job_id, request, &request.visual);

        let error = match primary {
            Ok(outcome) => return outcome,
            Err(e) => e,
        };

        let fallback = request
            .fallback_theme
            .as_deref()
            .filter(|_| error.is_recoverable_with_other_source())
            .filter(|theme| request.visual != VisualRequest::Theme((*theme).to_string()));

        let Some(theme) = fallback else {
            return JobOutcome::failed(job_id, &error);
        };

        warn!("[{job_id}] 主要素材失敗 ({}), 改用主題 {theme} 重試", error.kind());
        let fallback_id = format!("{job_id}_fallback");
        match self.compose_with(&fallback_id, request, &VisualRequest::Theme(theme.to_string())) {
            Ok(mut outcome) => {
                outcome.job_id = job_id.to_string();
                outcome.used_fallback = true;
                outcome
            }
            Err(fallback_error) => {
                error!("[{job_id}] 備援主題也失敗: {fallback_error}");
                let mut outcome = JobOutcome::failed(job_id, &fallback_error);
                outcome.used_fallback = true;
                outcome
            }
        }
    }

    fn compose_with(
        &self,
        job_id: &str,
        request: &JobRequest,
        visual: &VisualRequest,
    ) -> ComposeResult<JobOutcome> {
        let resolved = self.resolve_visual(job_id, request, visual)?;
        let compose_request = request.to_compose_request(job_id, resolved.source);
        let result = self.composer.compose(&compose_request);

        if let Some(placeholder) = resolved.placeholder
            && let Err(e) = fs::remove_file(&placeholder)
        {
            warn!("[{job_id}] 無法刪除佔位影片 {}: {e}", placeholder.display());
        }

        let report = result?;
        Ok(JobOutcome::completed(&report, false))
    }

    fn resolve_visual(
        &self,
        job_id: &str,
        request: &JobRequest,
        visual: &VisualRequest,
    ) -> ComposeResult<ResolvedVisual> {
        match visual {
            VisualRequest::Background(path) => Ok(ResolvedVisual {
                source: VisualSource::Background(path.clone()),
                placeholder: None,
            }),
            VisualRequest::Segments(segments) => Ok(ResolvedVisual {
                source: VisualSource::Segments(segments.iter().map(VisualItem::from).collect()),
                placeholder: None,
            }),
            VisualRequest::Theme(theme) => self.resolve_theme(job_id, request, theme),
        }
    }

    /// 從主題資料夾挑一支影片；沒有可用影片時產生黑色佔位影片
    fn resolve_theme(
        &self,
        job_id: &str,
        request: &JobRequest,
        theme: &str,
    ) -> ComposeResult<ResolvedVisual> {
        let settings = self.composer.settings();
        let frame = self.composer.resolve_frame(request.frame)?;
        let theme_settings = settings
            .themes
            .get(theme)
            .ok_or_else(|| ComposeError::Planning(format!("未設定的主題: {theme}")))?;

        let videos = scan_video_files(&theme_settings.background_dir, self.composer.media_types())
            .map_err(|e| ComposeError::Planning(format!("無法掃描主題 {theme}: {e:#}")))?;

        let mut rng = settings
            .random_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        if let Some(video) = videos.choose(&mut rng) {
            info!("[{job_id}] 主題 {theme} 選用: {}", video.display());
            return Ok(ResolvedVisual {
                source: VisualSource::Background(video.clone()),
                placeholder: None,
            });
        }

        warn!(
            "[{job_id}] 主題 {theme} 沒有可用影片 ({})，產生佔位影片",
            theme_settings.background_dir.display()
        );
        ensure_directory_exists(&settings.work_dir)?;
        let placeholder_path = settings.work_dir.join(format!("{job_id}_placeholder.mp4"));
        let plan = RenderPlan::placeholder(
            &frame,
            settings.placeholder_duration,
            &settings.encoder,
            &placeholder_path,
        );
        let rendered = self.composer.render(&plan)?;

        Ok(ResolvedVisual {
            source: VisualSource::Background(rendered.clone()),
            placeholder: Some(rendered),
        })
    }

    /// 執行工作檔並在旁邊寫入 `<job>.outcome.json`
    pub fn run_file(&self, job_file: &Path) -> JobOutcome {
        let stem = job_stem(job_file);

        let outcome = match JobRequest::from_file(job_file) {
            Ok(request) => {
                let job_id = request.job_id.clone().unwrap_or_else(|| stem.clone());
                self.run_request(&job_id, &request)
            }
            Err(e) => {
                error!("[{stem}] {e:#}");
                JobOutcome::invalid_request(&stem, &e)
            }
        };

        let outcome_path = outcome_path_for(job_file);
        if let Err(e) = write_outcome(&outcome_path, &outcome) {
            warn!("{e:#}");
        }
        outcome
    }

    /// 以 `batch_parallelism` 個執行緒同時執行多個工作檔
    pub fn run_batch(&self, job_files: &[PathBuf]) -> Result<Vec<JobOutcome>> {
        let threads = self.composer.settings().batch_parallelism.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("無法建立執行緒池")?;

        info!("批次執行 {} 個工作 ({threads} 執行緒)", job_files.len());
        let outcomes: Vec<JobOutcome> = pool.install(|| {
            job_files
                .par_iter()
                .map(|job_file| {
                    if let Err(e) = self.composer.check_cancelled() {
                        return JobOutcome::failed(&job_stem(job_file), &e);
                    }
                    self.run_file(job_file)
                })
                .collect()
        });
        Ok(outcomes)
    }
}

/// 工作檔檔名（不含副檔名），未指定 job_id 時作為預設值
fn job_stem(job_file: &Path) -> String {
    job_file
        .file_stem()
        .map_or_else(|| "job".to_string(), |s| s.to_string_lossy().to_string())
}

#[must_use]
pub fn outcome_path_for(job_file: &Path) -> PathBuf {
    job_file.with_file_name(format!("{}.outcome.json", job_stem(job_file)))
}

fn write_outcome(path: &Path, outcome: &JobOutcome) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome).context("無法序列化工作結果")?;
    fs::write(path, json).with_context(|| format!("無法寫入結果檔: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_path_for() {
        assert_eq!(
            outcome_path_for(Path::new("/jobs/demo.json")),
            PathBuf::from("/jobs/demo.outcome.json")
        );
    }
}
