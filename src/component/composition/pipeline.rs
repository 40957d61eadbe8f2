use super::debug_artifacts::{DebugArtifacts, ProbeRecord};
use super::job::{ComposeRequest, CompositionJob, NarrationTrack, VisualSource, validate_job_id};
use super::render_plan::RenderPlan;
use crate::component::caption_timing::allocate_captions;
use crate::component::subtitle_track::{SubtitleMode, SubtitleTrack};
use crate::component::visual_reconciler::{
    SegmentSource, VisualPlan, plan_background, plan_segment_sequence,
};
use crate::config::{ComposerSettings, FrameSettings, MediaTypeTable};
use crate::error::{ComposeError, ComposeResult};
use crate::signal::is_cancelled;
use crate::tools::{Transcoder, ensure_directory_exists, require_artifact};
use log::{debug, error, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const SUBTITLE_FILE: &str = "captions.ass";

/// 合成成功的摘要
#[derive(Debug, Clone, Serialize)]
pub struct ComposeReport {
    pub job_id: String,
    pub output_path: PathBuf,
    pub narration_duration: f64,
    pub caption_count: usize,
    pub subtitle_mode: SubtitleMode,
    pub visual_plan: VisualPlan,
    pub debug_dir: Option<PathBuf>,
}

/// 合成管線：probe → 字幕 → 視覺規劃 → 轉碼
///
/// 每個工作使用獨立的中間檔目錄，可在多執行緒下共用同一個 `Composer`
pub struct Composer<T: Transcoder> {
    transcoder: T,
    settings: ComposerSettings,
    media_types: MediaTypeTable,
    shutdown_signal: Arc<AtomicBool>,
}

impl<T: Transcoder> Composer<T> {
    pub fn new(
        transcoder: T,
        settings: ComposerSettings,
        media_types: MediaTypeTable,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transcoder,
            settings,
            media_types,
            shutdown_signal,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ComposerSettings {
        &self.settings
    }

    #[must_use]
    pub const fn media_types(&self) -> &MediaTypeTable {
        &self.media_types
    }

    #[must_use]
    pub const fn transcoder(&self) -> &T {
        &self.transcoder
    }

    /// 下一個外部程序前檢查中斷旗標
    pub fn check_cancelled(&self) -> ComposeResult<()> {
        if is_cancelled(&self.shutdown_signal) {
            return Err(ComposeError::Cancelled);
        }
        Ok(())
    }

    /// 中間檔目錄 `<work_dir>/<job_id>`
    #[must_use]
    pub fn job_work_dir(&self, job_id: &str) -> PathBuf {
        self.settings.work_dir.join(job_id)
    }

    /// 工作指定的畫面設定優先，並檢查是否可用
    pub fn resolve_frame(&self, frame: Option<FrameSettings>) -> ComposeResult<FrameSettings> {
        let frame = frame.unwrap_or(self.settings.frame);
        if !frame.is_valid() {
            return Err(ComposeError::Planning(format!(
                "畫面設定無效: {}x{} @{}fps",
                frame.width, frame.height, frame.fps
            )));
        }
        Ok(frame)
    }

    /// 執行一個合成工作
    ///
    /// 不論成功與否都會清除中間檔目錄；失敗時不保留不完整的輸出檔
    pub fn compose(&self, request: &ComposeRequest) -> ComposeResult<ComposeReport> {
        let job_id = request
            .job_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        validate_job_id(&job_id)?;
        let frame = self.resolve_frame(request.frame)?;
        info!("[{job_id}] 開始合成: {}", request.output.display());

        let debug = if self.settings.debug {
            Some(DebugArtifacts::create(&self.settings.debug_dir, &job_id)?)
        } else {
            None
        };

        // 目錄已存在代表另一個相同 job_id 的工作正在使用，不可共用也不可刪除
        ensure_directory_exists(&self.settings.work_dir)?;
        let work_dir = self.job_work_dir(&job_id);
        fs::create_dir(&work_dir).map_err(|e| ComposeError::io(&work_dir, e))?;

        let result = self.run(&job_id, request, frame, &work_dir, debug.as_ref());

        if let Err(e) = fs::remove_dir_all(&work_dir) {
            warn!("[{job_id}] 無法清除中間檔目錄 {}: {e}", work_dir.display());
        }

        match result {
            Ok(mut report) => {
                report.debug_dir = debug.map(|d| d.dir().to_path_buf());
                info!(
                    "[{job_id}] 完成: {} ({:.2}s)",
                    report.output_path.display(),
                    report.narration_duration
                );
                Ok(report)
            }
            Err(e) => {
                error!("[{job_id}] 合成失敗 ({}): {e}", e.kind());
                if let Some(debug) = &debug {
                    debug.write_error(&e);
                }
                Err(e)
            }
        }
    }

    fn run(
        &self,
        job_id: &str,
        request: &ComposeRequest,
        frame: FrameSettings,
        work_dir: &Path,
        debug: Option<&DebugArtifacts>,
    ) -> ComposeResult<ComposeReport> {
        let mut probes = Vec::new();

        let narration = self.resolve_narration(request, &mut probes)?;
        let subtitle_track = self.build_subtitles(request, narration.duration, &frame)?;

        let subtitle_path = work_dir.join(SUBTITLE_FILE);
        subtitle_track.write(&subtitle_path)?;
        require_artifact(&subtitle_path)?;
        debug!("[{job_id}] 字幕檔: {}", subtitle_path.display());

        let visual_plan = self.reconcile(&request.visual, narration.duration, &mut probes)?;
        info!("[{job_id}] 視覺策略: {}", visual_plan.describe());

        let job = CompositionJob {
            job_id: job_id.to_string(),
            narration,
            subtitle_track,
            subtitle_path,
            visual_plan,
            frame,
            output_path: request.output.clone(),
        };
        let render_plan = RenderPlan::for_job(&job, &self.settings.encoder);

        if let Some(debug) = debug {
            debug.write_captions(&job.subtitle_track);
            debug.write_probes(&probes);
            debug.write_plan(&job.visual_plan);
            debug.write_command(&self.settings.transcoder.ffmpeg_path, &render_plan);
        }

        let output_path = self.render(&render_plan)?;

        Ok(ComposeReport {
            job_id: job.job_id,
            output_path,
            narration_duration: job.narration.duration,
            caption_count: job.subtitle_track.segments().len(),
            subtitle_mode: job.subtitle_track.mode(),
            visual_plan: job.visual_plan,
            debug_dir: None,
        })
    }

    fn resolve_narration(
        &self,
        request: &ComposeRequest,
        probes: &mut Vec<ProbeRecord>,
    ) -> ComposeResult<NarrationTrack> {
        let path = &request.narration;
        if !path.is_file() {
            return Err(ComposeError::probe(path, "旁白檔案不存在"));
        }

        let duration = match request.narration_duration {
            Some(duration) => {
                if !duration.is_finite() || duration <= 0.0 {
                    return Err(ComposeError::probe(
                        path,
                        format!("提供的旁白長度無效: {duration}"),
                    ));
                }
                probes.push(ProbeRecord {
                    path: path.clone(),
                    duration: Some(duration),
                    source: "provided",
                });
                duration
            }
            None => {
                let duration = self.probe(path)?;
                probes.push(ProbeRecord {
                    path: path.clone(),
                    duration: Some(duration),
                    source: "probe",
                });
                duration
            }
        };

        Ok(NarrationTrack {
            path: path.clone(),
            duration,
        })
    }

    /// 有對齊資料時使用逐字母效果，資料無效則退回估算
    fn build_subtitles(
        &self,
        request: &ComposeRequest,
        duration: f64,
        frame: &FrameSettings,
    ) -> ComposeResult<SubtitleTrack> {
        let style = &self.settings.subtitle_style;
        let hook = request.hook.as_deref();

        if let Some(words) = request.word_alignment.as_deref().filter(|w| !w.is_empty()) {
            match SubtitleTrack::from_alignment(words, hook, style, frame) {
                Ok(track) => return Ok(track),
                Err(e) => warn!("對齊資料無法使用，改用估算時間: {e}"),
            }
        }

        let segments = allocate_captions(
            &request.script,
            hook,
            duration,
            &self.settings.caption_timing,
        )?;
        Ok(SubtitleTrack::from_segments(segments, style, frame))
    }

    fn reconcile(
        &self,
        visual: &VisualSource,
        duration: f64,
        probes: &mut Vec<ProbeRecord>,
    ) -> ComposeResult<VisualPlan> {
        match visual {
            VisualSource::Background(path) => {
                let source_duration = self.probe(path)?;
                probes.push(ProbeRecord {
                    path: path.clone(),
                    duration: Some(source_duration),
                    source: "probe",
                });
                let mut rng = self.rng();
                let plan = plan_background(path, source_duration, duration, &mut rng)?;
                Ok(VisualPlan::Background(plan))
            }
            VisualSource::Segments(items) => {
                if items.is_empty() {
                    return Err(ComposeError::Planning("素材列表為空".to_string()));
                }
                let mut sources = Vec::with_capacity(items.len());
                for item in items {
                    let source_duration = if self.media_types.is_image_file(&item.path) {
                        if !item.path.is_file() {
                            return Err(ComposeError::probe(&item.path, "圖片檔案不存在"));
                        }
                        None
                    } else {
                        Some(self.probe(&item.path)?)
                    };
                    probes.push(ProbeRecord {
                        path: item.path.clone(),
                        duration: source_duration,
                        source: if source_duration.is_some() { "probe" } else { "still_image" },
                    });
                    sources.push(SegmentSource {
                        path: item.path.clone(),
                        weight: item.duration,
                        source_duration,
                        force_loop: item.force_loop,
                    });
                }
                let segments = plan_segment_sequence(&sources, duration)?;
                Ok(VisualPlan::SegmentSequence { segments })
            }
        }
    }

    /// 固定種子時結果可重現
    fn rng(&self) -> StdRng {
        self.settings
            .random_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    fn probe(&self, path: &Path) -> ComposeResult<f64> {
        self.check_cancelled()?;
        debug!("probe: {}", path.display());
        let duration = self.transcoder.probe(path)?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ComposeError::probe(path, format!("長度無效: {duration}")));
        }
        Ok(duration)
    }

    /// 執行轉碼，失敗時刪除不完整的輸出檔
    pub fn render(&self, plan: &RenderPlan) -> ComposeResult<PathBuf> {
        self.check_cancelled()?;

        if let Some(parent) = plan.output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_directory_exists(parent)?;
        }
        // 舊檔會讓「輸出檔存在」的檢查失去意義
        if plan.output_path.exists() {
            debug!("移除舊的輸出檔: {}", plan.output_path.display());
            fs::remove_file(&plan.output_path)
                .map_err(|e| ComposeError::io(&plan.output_path, e))?;
        }

        match self.transcoder.render(plan) {
            Ok(path) => {
                require_artifact(&path).map_err(|_| ComposeError::Render {
                    exit_code: Some(0),
                    diagnostics: format!("轉碼器回報成功但輸出檔不存在: {}", path.display()),
                })?;
                Ok(path)
            }
            Err(e) => {
                if plan.output_path.exists() {
                    warn!("刪除不完整的輸出檔: {}", plan.output_path.display());
                    if let Err(remove_error) = fs::remove_file(&plan.output_path) {
                        warn!("無法刪除 {}: {remove_error}", plan.output_path.display());
                    }
                }
                Err(e)
            }
        }
    }
}
