use super::filter_graph::{
    AUDIO_OUT, VIDEO_OUT, audio_filter, background_graph, format_seconds, segment_graph,
};
use super::job::CompositionJob;
use crate::component::visual_reconciler::VisualPlan;
use crate::config::{EncoderSettings, FrameSettings};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 一個轉碼輸入（`-i` 前的參數加上來源）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSpec {
    pub pre_args: Vec<String>,
    pub source: String,
}

impl InputSpec {
    #[must_use]
    pub fn file(path: &Path) -> Self {
        Self {
            pre_args: Vec::new(),
            source: path.to_string_lossy().to_string(),
        }
    }

    /// 無限循環的影片輸入，由濾鏡的 trim 決定長度
    #[must_use]
    pub fn looped(path: &Path) -> Self {
        Self {
            pre_args: vec!["-stream_loop".to_string(), "-1".to_string()],
            ..Self::file(path)
        }
    }

    /// 從指定秒數開始讀取
    #[must_use]
    pub fn seeked(path: &Path, offset: f64) -> Self {
        Self {
            pre_args: vec!["-ss".to_string(), format_seconds(offset)],
            ..Self::file(path)
        }
    }

    /// 靜態圖片重複成影格
    #[must_use]
    pub fn still_image(path: &Path, fps: u32) -> Self {
        Self {
            pre_args: vec![
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                fps.to_string(),
            ],
            ..Self::file(path)
        }
    }

    #[must_use]
    pub fn lavfi(expression: String) -> Self {
        Self {
            pre_args: vec!["-f".to_string(), "lavfi".to_string()],
            source: expression,
        }
    }
}

/// 一次轉碼的完整參數
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub inputs: Vec<InputSpec>,
    pub filter_graph: Option<String>,
    pub maps: Vec<String>,
    pub output_args: Vec<String>,
    pub output_path: PathBuf,
    /// 預期輸出長度，僅供進度顯示
    pub expected_duration: f64,
}

impl RenderPlan {
    /// 依視覺計畫組出輸入、濾鏡與輸出參數
    #[must_use]
    pub fn for_job(job: &CompositionJob, encoder: &EncoderSettings) -> Self {
        let frame = &job.frame;
        let (mut inputs, mut graph) = match &job.visual_plan {
            VisualPlan::Background(plan) => {
                let input = if plan.looped {
                    InputSpec::looped(&plan.source_path)
                } else {
                    InputSpec::seeked(&plan.source_path, plan.start_offset)
                };
                (vec![input], background_graph(plan, frame, &job.subtitle_path))
            }
            VisualPlan::SegmentSequence { segments } => {
                let inputs = segments
                    .iter()
                    .map(|slot| {
                        if slot.still_image {
                            InputSpec::still_image(&slot.path, frame.fps)
                        } else if slot.looped {
                            InputSpec::looped(&slot.path)
                        } else {
                            InputSpec::file(&slot.path)
                        }
                    })
                    .collect();
                (inputs, segment_graph(segments, frame, &job.subtitle_path))
            }
        };

        let audio_input = inputs.len();
        inputs.push(InputSpec::file(&job.narration.path));

        let audio_map = match audio_filter(audio_input, encoder.audio_volume) {
            Some(filter) => {
                graph.push(';');
                graph.push_str(&filter);
                format!("[{AUDIO_OUT}]")
            }
            None => format!("{audio_input}:a:0"),
        };

        Self {
            inputs,
            filter_graph: Some(graph),
            maps: vec![format!("[{VIDEO_OUT}]"), audio_map],
            output_args: encode_args(encoder, frame, job.narration.duration),
            output_path: job.output_path.clone(),
            expected_duration: job.narration.duration,
        }
    }

    /// 黑色佔位影片（主題資料夾沒有可用影片時使用）
    #[must_use]
    pub fn placeholder(
        frame: &FrameSettings,
        duration: f64,
        encoder: &EncoderSettings,
        output_path: &Path,
    ) -> Self {
        let source = format!(
            "color=c=black:s={}x{}:r={}:d={}",
            frame.width,
            frame.height,
            frame.fps,
            format_seconds(duration)
        );
        Self {
            inputs: vec![InputSpec::lavfi(source)],
            filter_graph: None,
            maps: Vec::new(),
            output_args: vec![
                "-c:v".to_string(),
                encoder.video_codec.clone(),
                "-pix_fmt".to_string(),
                encoder.pix_fmt.clone(),
                "-an".to_string(),
            ],
            output_path: output_path.to_path_buf(),
            expected_duration: duration,
        }
    }

    /// 轉碼器參數（不含程式名稱）
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-y"]
            .iter()
            .map(ToString::to_string)
            .collect();

        for input in &self.inputs {
            args.extend(input.pre_args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }
        if let Some(graph) = &self.filter_graph {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }
        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }
        args.extend(self.output_args.iter().cloned());
        args.push(self.output_path.to_string_lossy().to_string());
        args
    }

    /// 可直接貼到 shell 的完整指令（除錯用）
    #[must_use]
    pub fn command_line(&self, program: &str) -> String {
        std::iter::once(program.to_string())
            .chain(self.to_args().iter().map(|arg| shell_quote(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn encode_args(encoder: &EncoderSettings, frame: &FrameSettings, duration: f64) -> Vec<String> {
    vec![
        "-c:v".to_string(),
        encoder.video_codec.clone(),
        "-preset".to_string(),
        encoder.preset.clone(),
        "-crf".to_string(),
        encoder.crf.to_string(),
        "-pix_fmt".to_string(),
        encoder.pix_fmt.clone(),
        "-r".to_string(),
        frame.fps.to_string(),
        "-c:a".to_string(),
        encoder.audio_codec.clone(),
        "-b:a".to_string(),
        encoder.audio_bitrate.clone(),
        "-t".to_string(),
        format_seconds(duration),
        "-shortest".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

fn shell_quote(arg: &str) -> String {
    let plain = arg
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,".contains(c));
    if plain && !arg.is_empty() {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
