//! 測試用的假轉碼器：probe 回傳預先設定的長度，render 依設定成功或失敗

#![allow(dead_code)]

use narration_composer::component::Composer;
use narration_composer::component::composition::RenderPlan;
use narration_composer::config::{ComposerSettings, Config};
use narration_composer::error::{ComposeError, ComposeResult};
use narration_composer::signal::never_cancelled;
use narration_composer::tools::Transcoder;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum RenderBehavior {
    /// 寫出輸出檔並成功
    Succeed,
    /// 寫出部分輸出檔後以指定結束碼失敗
    Fail { exit_code: i32, stderr: String },
    /// 回報成功但不寫出輸出檔
    SucceedWithoutOutput,
    /// 任一輸入路徑包含指定字串時失敗，否則成功
    FailWhenInputContains(String),
}

pub struct FakeTranscoder {
    durations: HashMap<PathBuf, f64>,
    behavior: RenderBehavior,
    probed: Mutex<Vec<PathBuf>>,
    renders: Mutex<Vec<RenderPlan>>,
    subtitles: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    pub fn new(behavior: RenderBehavior) -> Self {
        Self {
            durations: HashMap::new(),
            behavior,
            probed: Mutex::new(Vec::new()),
            renders: Mutex::new(Vec::new()),
            subtitles: Mutex::new(Vec::new()),
        }
    }

    pub fn with_duration(mut self, path: impl Into<PathBuf>, seconds: f64) -> Self {
        self.durations.insert(path.into(), seconds);
        self
    }

    pub fn probed(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<RenderPlan> {
        self.renders.lock().unwrap().clone()
    }

    /// 每次轉碼當下讀到的字幕檔內容
    pub fn subtitles(&self) -> Vec<String> {
        self.subtitles.lock().unwrap().clone()
    }

    fn capture_subtitle(&self, plan: &RenderPlan) {
        let Some(graph) = &plan.filter_graph else {
            return;
        };
        let Some(start) = graph.find("subtitles='") else {
            return;
        };
        let rest = &graph[start + "subtitles='".len()..];
        let Some(end) = rest.find('\'') else {
            return;
        };
        let content = fs::read_to_string(&rest[..end]).unwrap();
        self.subtitles.lock().unwrap().push(content);
    }
}

impl Transcoder for FakeTranscoder {
    fn probe(&self, path: &Path) -> ComposeResult<f64> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        self.durations
            .get(path)
            .copied()
            .ok_or_else(|| ComposeError::probe(path, "no duration"))
    }

    fn render(&self, plan: &RenderPlan) -> ComposeResult<PathBuf> {
        self.renders.lock().unwrap().push(plan.clone());
        self.capture_subtitle(plan);

        let fail = match &self.behavior {
            RenderBehavior::Succeed => None,
            RenderBehavior::Fail { exit_code, stderr } => Some((*exit_code, stderr.clone())),
            RenderBehavior::SucceedWithoutOutput => return Ok(plan.output_path.clone()),
            RenderBehavior::FailWhenInputContains(needle) => plan
                .inputs
                .iter()
                .any(|input| input.source.contains(needle.as_str()))
                .then(|| (1, format!("{needle}: Invalid data found when processing input"))),
        };

        match fail {
            None => {
                fs::write(&plan.output_path, b"fake video").unwrap();
                Ok(plan.output_path.clone())
            }
            Some((exit_code, stderr)) => {
                fs::write(&plan.output_path, b"partial").unwrap();
                Err(ComposeError::Render {
                    exit_code: Some(exit_code),
                    diagnostics: stderr,
                })
            }
        }
    }
}

pub fn test_settings(root: &Path) -> ComposerSettings {
    ComposerSettings {
        work_dir: root.join("work"),
        debug_dir: root.join("debug"),
        random_seed: Some(7),
        ..ComposerSettings::default()
    }
}

pub fn composer(transcoder: FakeTranscoder, settings: ComposerSettings) -> Composer<FakeTranscoder> {
    let config = Config::with_settings(settings).unwrap();
    Composer::new(
        transcoder,
        config.settings,
        config.media_types,
        never_cancelled(),
    )
}

/// 建立非空的假媒體檔
pub fn touch(path: &Path) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"media").unwrap();
    path.to_path_buf()
}
