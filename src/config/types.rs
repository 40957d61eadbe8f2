use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// 媒體副檔名對照表（編譯時嵌入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
    #[serde(rename = "IMAGE_FILE")]
    pub image_file: Vec<String>,
}

impl MediaTypeTable {
    fn extension_of(path: &Path) -> Option<String> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
    }

    fn to_set(list: &[String]) -> HashSet<String> {
        list.iter().map(|ext| ext.to_lowercase()).collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = Self::to_set(&self.video_file);
        Self::extension_of(path).is_some_and(|ext| video_extensions.contains(&ext))
    }

    #[must_use]
    pub fn is_image_file(&self, path: &Path) -> bool {
        let image_extensions = Self::to_set(&self.image_file);
        Self::extension_of(path).is_some_and(|ext| image_extensions.contains(&ext))
    }
}

/// 字幕時間分配參數
///
/// 停頓權重與 hook 上下限皆為經驗值，保留為可覆寫設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionTimingSettings {
    /// 逗號停頓（秒）
    pub comma_pause: f64,
    /// 句尾符號停頓（秒）
    pub terminator_pause: f64,
    /// 停頓總和佔內文時長的上限比例
    pub max_silence_ratio: f64,
    pub min_segment_duration: f64,
    /// 字幕提前顯示的秒數
    pub lead_in: f64,
    pub hook_min: f64,
    pub hook_max: f64,
}

impl Default for CaptionTimingSettings {
    fn default() -> Self {
        Self {
            comma_pause: 0.3,
            terminator_pause: 0.5,
            max_silence_ratio: 0.3,
            min_segment_duration: 0.15,
            lead_in: 0.15,
            hook_min: 1.5,
            hook_max: 2.5,
        }
    }
}

/// ASS 字幕樣式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyleSettings {
    pub font_name: String,
    pub body_font_size: u32,
    pub hook_font_size: u32,
    pub body_outline: u32,
    pub hook_outline: u32,
    pub primary_colour: String,
    pub outline_colour: String,
    /// ASS 對齊（numpad 配置，5 = 畫面正中）
    pub alignment: u8,
    pub margin_v: u32,
    /// 彈出動畫起始縮放（%）
    pub pop_scale: u32,
    /// 彈出動畫回到 100% 所需毫秒
    pub pop_duration_ms: u32,
    pub uppercase_body: bool,
    pub strip_body_punctuation: bool,
    /// 打字機效果每個字母的最大間隔
    pub typewriter_step_ms: u32,
    /// 對齊資料路徑的提前顯示秒數
    pub alignment_lead_in: f64,
}

impl Default for SubtitleStyleSettings {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            body_font_size: 85,
            hook_font_size: 100,
            body_outline: 3,
            hook_outline: 5,
            primary_colour: "&H00FFFFFF".to_string(),
            outline_colour: "&H00000000".to_string(),
            alignment: 5,
            margin_v: 600,
            pop_scale: 115,
            pop_duration_ms: 80,
            uppercase_body: true,
            strip_body_punctuation: true,
            typewriter_step_ms: 50,
            alignment_lead_in: 0.10,
        }
    }
}

/// 輸出畫面尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl FrameSettings {
    /// 寬、高與 fps 都必須大於 0
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.fps > 0
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pix_fmt: String,
    /// 旁白音量（1.0 為原音量）
    pub audio_volume: f64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            pix_fmt: "yuv420p".to_string(),
            audio_volume: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscoderSettings {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl Default for TranscoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

/// 主題設定：主題名稱對應背景影片資料夾
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThemeSettings {
    pub background_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerSettings {
    pub caption_timing: CaptionTimingSettings,
    pub subtitle_style: SubtitleStyleSettings,
    pub frame: FrameSettings,
    pub encoder: EncoderSettings,
    pub transcoder: TranscoderSettings,
    /// 每個工作的中間檔根目錄
    pub work_dir: PathBuf,
    /// 保留除錯檔案
    pub debug: bool,
    pub debug_dir: PathBuf,
    /// 固定亂數種子（背景起點、主題影片挑選）
    pub random_seed: Option<u64>,
    pub themes: BTreeMap<String, ThemeSettings>,
    /// 主題資料夾沒有影片時產生的黑色佔位影片長度（秒）
    pub placeholder_duration: f64,
    pub batch_parallelism: usize,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            caption_timing: CaptionTimingSettings::default(),
            subtitle_style: SubtitleStyleSettings::default(),
            frame: FrameSettings::default(),
            encoder: EncoderSettings::default(),
            transcoder: TranscoderSettings::default(),
            work_dir: std::env::temp_dir().join("narration_composer"),
            debug: false,
            debug_dir: PathBuf::from("debug"),
            random_seed: None,
            themes: BTreeMap::new(),
            placeholder_duration: 10.0,
            batch_parallelism: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub media_types: MediaTypeTable,
    pub settings: ComposerSettings,
}
