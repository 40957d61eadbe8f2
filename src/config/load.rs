use crate::config::types::{ComposerSettings, Config, MediaTypeTable};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// 編譯時嵌入的媒體類型設定（不需要外部檔案）
const MEDIA_TYPE_TABLE_JSON: &str = include_str!("data/media_types.json");

impl Config {
    /// 從工作目錄的 settings.json 載入，不存在時使用預設值
    pub fn new() -> Result<Self> {
        let path = Path::new("settings.json");
        let settings = if path.exists() {
            Self::load_settings(path)?
        } else {
            ComposerSettings::default()
        };
        Self::with_settings(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = Self::load_settings(path)?;
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: ComposerSettings) -> Result<Self> {
        let config = Self {
            media_types: Self::load_embedded_media_types()?,
            settings,
        };
        config.validate()?;
        Ok(config)
    }

    fn load_settings(path: &Path) -> Result<ComposerSettings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 從編譯時嵌入的 JSON 載入媒體類型表
    fn load_embedded_media_types() -> Result<MediaTypeTable> {
        serde_json::from_str(MEDIA_TYPE_TABLE_JSON).context("無法解析嵌入的媒體類型設定")
    }

    /// 檢查設定值是否在合理範圍
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;

        if !s.frame.is_valid() {
            bail!(
                "畫面設定無效: {}x{} @{}fps",
                s.frame.width,
                s.frame.height,
                s.frame.fps
            );
        }

        let timing = &s.caption_timing;
        if timing.hook_min <= 0.0 || timing.hook_min > timing.hook_max {
            bail!(
                "hook 時長範圍無效: [{}, {}]",
                timing.hook_min,
                timing.hook_max
            );
        }
        if timing.comma_pause < 0.0 || timing.terminator_pause < 0.0 {
            bail!("停頓權重不可為負數");
        }
        if !(0.0..1.0).contains(&timing.max_silence_ratio) {
            bail!("停頓比例必須介於 0 與 1 之間: {}", timing.max_silence_ratio);
        }
        if timing.min_segment_duration < 0.0 || timing.lead_in < 0.0 {
            bail!("最短字幕時長與提前顯示秒數不可為負數");
        }

        let style = &s.subtitle_style;
        if !(110..=120).contains(&style.pop_scale) {
            bail!("彈出動畫縮放必須介於 110% 到 120%: {}", style.pop_scale);
        }
        if !(80..=150).contains(&style.pop_duration_ms) {
            bail!(
                "彈出動畫時間必須介於 80 到 150 毫秒: {}",
                style.pop_duration_ms
            );
        }

        if s.encoder.audio_volume < 0.0 {
            bail!("音量不可為負數: {}", s.encoder.audio_volume);
        }
        if s.placeholder_duration <= 0.0 {
            bail!("佔位影片長度必須大於 0");
        }
        if s.batch_parallelism == 0 {
            bail!("batch_parallelism 至少為 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_embedded_media_types() {
        let table = Config::load_embedded_media_types().unwrap();
        assert!(table.is_video_file(Path::new("/clips/a.MP4")));
        assert!(table.is_image_file(Path::new("/img/scene_0.png")));
        assert!(!table.is_video_file(Path::new("/img/scene_0.png")));
        assert!(!table.is_image_file(Path::new("/no_extension")));
    }

    #[test]
    fn test_default_settings_are_valid() {
        let config = Config::with_settings(ComposerSettings::default()).unwrap();
        assert_eq!(config.settings.frame.width, 1080);
        assert_eq!(config.settings.frame.height, 1920);
        assert_eq!(config.settings.frame.fps, 30);
        assert!((config.settings.caption_timing.comma_pause - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let json = r#"{ "debug": true, "caption_timing": { "lead_in": 0.1 } }"#;
        let settings: ComposerSettings = serde_json::from_str(json).unwrap();
        assert!(settings.debug);
        assert!((settings.caption_timing.lead_in - 0.1).abs() < 1e-9);
        assert!((settings.caption_timing.hook_max - 2.5).abs() < 1e-9);
        assert!(settings.subtitle_style.uppercase_body);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = ComposerSettings::default();
        settings.subtitle_style.pop_scale = 150;
        assert!(Config::with_settings(settings).is_err());

        let mut settings = ComposerSettings::default();
        settings.caption_timing.hook_min = 3.0;
        assert!(Config::with_settings(settings).is_err());

        let mut settings = ComposerSettings::default();
        settings.frame.fps = 0;
        assert!(Config::with_settings(settings).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{ "random_seed": 7, "themes": { "scary": { "background_dir": "/bg/scary" } } }"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.settings.random_seed, Some(7));
        assert_eq!(
            config.settings.themes["scary"].background_dir,
            Path::new("/bg/scary")
        );
    }
}
