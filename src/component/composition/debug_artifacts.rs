use super::render_plan::RenderPlan;
use crate::component::subtitle_track::SubtitleTrack;
use crate::component::visual_reconciler::VisualPlan;
use crate::error::{ComposeError, ComposeResult};
use crate::tools::ensure_directory_exists;
use log::{debug, warn};
use serde::Serialize;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

/// 一次 probe 的紀錄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeRecord {
    pub path: PathBuf,
    /// None 表示未 probe（靜態圖片或呼叫端提供長度）
    pub duration: Option<f64>,
    pub source: &'static str,
}

/// 除錯模式下保留的檔案
///
/// 寫入失敗只記錄警告，不影響合成結果
pub struct DebugArtifacts {
    dir: PathBuf,
}

impl DebugArtifacts {
    /// 建立 `<root>/<job_id>_debug/`
    pub fn create(root: &Path, job_id: &str) -> ComposeResult<Self> {
        let dir = root.join(format!("{job_id}_debug"));
        ensure_directory_exists(&dir)?;
        debug!("除錯資料夾: {}", dir.display());
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, name: &str, contents: &str) {
        let path = self.dir.join(name);
        if let Err(e) = fs::write(&path, contents) {
            warn!("無法寫入除錯檔案 {}: {e}", path.display());
        }
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => self.write(name, &json),
            Err(e) => warn!("無法序列化除錯資料 {name}: {e}"),
        }
    }

    /// captions.ass、captions.srt 與逐段時間表
    pub fn write_captions(&self, track: &SubtitleTrack) {
        self.write("captions.ass", &track.to_ass());
        self.write("captions.srt", &track.to_srt());
        self.write("captions_info.txt", &captions_info(track));
    }

    pub fn write_probes(&self, probes: &[ProbeRecord]) {
        self.write_json("probes.json", &probes);
    }

    pub fn write_plan(&self, plan: &VisualPlan) {
        self.write_json("plan.json", plan);
    }

    pub fn write_command(&self, program: &str, render_plan: &RenderPlan) {
        let mut text = render_plan.command_line(program);
        text.push('\n');
        if let Some(graph) = &render_plan.filter_graph {
            let _ = writeln!(text, "\n# filter_complex");
            for chain in graph.split(';') {
                let _ = writeln!(text, "{chain}");
            }
        }
        self.write("command.txt", &text);
    }

    pub fn write_error(&self, error: &ComposeError) {
        let mut text = format!("kind: {}\nreason: {error}\n", error.kind());
        if let Some(diagnostics) = error.diagnostics() {
            let _ = write!(text, "\n{diagnostics}\n");
        }
        self.write("error.txt", &text);
    }
}

fn captions_info(track: &SubtitleTrack) -> String {
    let mut info = String::new();
    let _ = writeln!(info, "mode: {:?}", track.mode());
    let _ = writeln!(info, "segments: {}", track.segments().len());
    let total: f64 = track.segments().iter().map(|s| s.duration).sum();
    let _ = writeln!(info, "total: {total:.3}s");
    let _ = writeln!(info);
    for (index, segment) in track.segments().iter().enumerate() {
        let _ = writeln!(
            info,
            "{index:>4} {:>5?} {:>8.3} -> {:>8.3} ({:.3}s) {}",
            segment.role,
            segment.start_time,
            segment.end_time(),
            segment.duration,
            segment.text
        );
    }
    info
}
