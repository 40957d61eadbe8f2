use super::ffprobe_info::probe_duration;
use super::progress::{DiagnosticTail, ProgressParser};
use crate::component::composition::RenderPlan;
use crate::config::TranscoderSettings;
use crate::error::{ComposeError, ComposeResult};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 外部轉碼器介面
///
/// 時間分配、字幕與素材規劃都不直接碰外部程序，只透過此介面，
/// 測試時可換成假的實作
pub trait Transcoder: Send + Sync {
    /// 取得媒體長度（秒），失敗回傳 `ComposeError::Probe`
    fn probe(&self, path: &Path) -> ComposeResult<f64>;

    /// 執行一次轉碼，成功時回傳輸出檔路徑
    fn render(&self, plan: &RenderPlan) -> ComposeResult<PathBuf>;
}

/// 以 ffmpeg / ffprobe 子程序實作的轉碼器
pub struct FfmpegTranscoder {
    ffmpeg: String,
    ffprobe: String,
    show_progress: bool,
}

impl FfmpegTranscoder {
    #[must_use]
    pub fn new(settings: &TranscoderSettings) -> Self {
        Self {
            ffmpeg: settings.ffmpeg_path.clone(),
            ffprobe: settings.ffprobe_path.clone(),
            show_progress: true,
        }
    }

    /// 批次模式下多個工作同時執行，關閉進度條避免畫面混亂
    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn create_progress_bar(&self, plan: &RenderPlan) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let total = (plan.expected_duration * 100.0).round().max(1.0) as u64;
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}",
        )
        .map(|s| s.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.set_message(
            plan.output_path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        bar
    }
}

impl Transcoder for FfmpegTranscoder {
    fn probe(&self, path: &Path) -> ComposeResult<f64> {
        probe_duration(&self.ffprobe, path)
    }

    fn render(&self, plan: &RenderPlan) -> ComposeResult<PathBuf> {
        let args = plan.to_args();
        debug!("執行 {} {}", self.ffmpeg, args.join(" "));
        info!("開始轉碼: {}", plan.output_path.display());

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ComposeError::Render {
                exit_code: None,
                diagnostics: format!("無法啟動 {}: {e}", self.ffmpeg),
            })?;

        let parser = ProgressParser::new().map_err(|e| ComposeError::Render {
            exit_code: None,
            diagnostics: format!("進度解析器建立失敗: {e}"),
        })?;
        let bar = self.create_progress_bar(plan);
        let mut tail = DiagnosticTail::default();

        // ffmpeg 以 \r 更新進度列，同時處理 \r 與 \n
        if let Some(stderr) = child.stderr.take() {
            let reader = BufReader::new(stderr);
            for chunk in reader.split(b'\r').map_while(Result::ok) {
                let text = String::from_utf8_lossy(&chunk);
                for line in text.split('\n') {
                    if let Some(seconds) = parser.parse_time(line) {
                        bar.set_position((seconds * 100.0).round() as u64);
                    } else {
                        tail.push(line);
                    }
                }
            }
        }

        let status = child.wait().map_err(|e| ComposeError::Render {
            exit_code: None,
            diagnostics: format!("等待 ffmpeg 結束失敗: {e}"),
        })?;
        bar.finish_and_clear();

        let diagnostics = tail.into_string();
        if !status.success() {
            warn!("ffmpeg 結束碼 {:?}: {}", status.code(), plan.output_path.display());
            return Err(ComposeError::Render {
                exit_code: status.code(),
                diagnostics,
            });
        }

        if !plan.output_path.exists() {
            return Err(ComposeError::Render {
                exit_code: status.code(),
                diagnostics: format!(
                    "ffmpeg 結束碼為 0 但輸出檔不存在: {}\n{diagnostics}",
                    plan.output_path.display()
                ),
            });
        }

        Ok(plan.output_path.clone())
    }
}
