//! 字幕軌產生元件
//!
//! 字幕段落轉為 ASS 字幕：hook / body 兩種樣式、彈出動畫；
//! 有逐字對齊資料時改用逐字母顯示效果

mod ass_document;
mod srt;
mod typewriter;

pub use ass_document::{
    BODY_STYLE, HOOK_STYLE, build_header, dialogue_line, escape_ass_text, format_ass_time,
    format_caption_text, pop_tag,
};
pub use srt::{format_srt_time, to_srt};
pub use typewriter::{WordTiming, segments_from_alignment, validate_alignment};

use crate::component::caption_timing::{CaptionRole, CaptionSegment};
use crate::config::{FrameSettings, SubtitleStyleSettings};
use crate::error::{ComposeError, ComposeResult};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// 一筆字幕事件
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    pub start: f64,
    pub end: f64,
    pub role: CaptionRole,
    /// 已跳脫並含動畫標籤的 ASS 文字
    pub markup: String,
}

/// 字幕來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleMode {
    /// 依字元比例估算的整字彈出
    Estimated,
    /// 外部對齊資料的逐字母顯示
    Aligned,
}

#[derive(Debug, Clone)]
pub struct SubtitleTrack {
    header: String,
    mode: SubtitleMode,
    segments: Vec<CaptionSegment>,
    entries: Vec<SubtitleEntry>,
}

impl SubtitleTrack {
    /// 每個字幕段落對應一筆事件
    #[must_use]
    pub fn from_segments(
        segments: Vec<CaptionSegment>,
        style: &SubtitleStyleSettings,
        frame: &FrameSettings,
    ) -> Self {
        let pop = pop_tag(style);
        let entries = segments
            .iter()
            .map(|segment| SubtitleEntry {
                start: segment.display_start(),
                end: segment.end_time(),
                role: segment.role,
                markup: format!(
                    "{pop}{}",
                    format_caption_text(&segment.text, segment.role, style)
                ),
            })
            .collect();

        Self {
            header: build_header(style, frame),
            mode: SubtitleMode::Estimated,
            segments,
            entries,
        }
    }

    /// 由逐字對齊資料建立，資料格式錯誤時立即失敗
    pub fn from_alignment(
        words: &[WordTiming],
        hook: Option<&str>,
        style: &SubtitleStyleSettings,
        frame: &FrameSettings,
    ) -> ComposeResult<Self> {
        if words.is_empty() {
            return Err(ComposeError::Planning("對齊資料為空".to_string()));
        }
        validate_alignment(words)?;

        let segments = segments_from_alignment(words, hook, style.alignment_lead_in);
        let entries = typewriter::typewriter_entries(&segments, style);

        Ok(Self {
            header: build_header(style, frame),
            mode: SubtitleMode::Aligned,
            segments,
            entries,
        })
    }

    #[must_use]
    pub const fn mode(&self) -> SubtitleMode {
        self.mode
    }

    #[must_use]
    pub fn segments(&self) -> &[CaptionSegment] {
        &self.segments
    }

    #[must_use]
    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn to_ass(&self) -> String {
        let mut document = self.header.clone();
        for entry in &self.entries {
            document.push_str(&dialogue_line(entry.start, entry.end, entry.role, &entry.markup));
            document.push('\n');
        }
        document
    }

    #[must_use]
    pub fn to_srt(&self) -> String {
        to_srt(&self.segments)
    }

    /// 以 UTF-8 寫入字幕檔
    pub fn write(&self, path: &Path) -> ComposeResult<()> {
        fs::write(path, self.to_ass()).map_err(|e| ComposeError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::caption_timing::allocate_captions;
    use crate::config::CaptionTimingSettings;

    fn track(script: &str, hook: Option<&str>, duration: f64) -> SubtitleTrack {
        let segments =
            allocate_captions(script, hook, duration, &CaptionTimingSettings::default()).unwrap();
        SubtitleTrack::from_segments(
            segments,
            &SubtitleStyleSettings::default(),
            &FrameSettings::default(),
        )
    }

    #[test]
    fn test_entries_match_segments_one_to_one() {
        let track = track(
            "Hook phrase here. Extra body text follows.",
            Some("Hook phrase here"),
            3.0,
        );
        assert_eq!(track.entries().len(), track.segments().len());
        assert_eq!(track.entries()[0].role, CaptionRole::Hook);
        assert_eq!(track.mode(), SubtitleMode::Estimated);
    }

    #[test]
    fn test_to_ass_document() {
        let track = track(
            "Hook phrase here. Extra body text follows.",
            Some("Hook phrase here"),
            3.0,
        );
        let ass = track.to_ass();
        assert!(ass.starts_with("[Script Info]"));
        assert!(ass.contains(
            "Dialogue: 0,0:00:00.00,0:00:01.50,Hook,,0,0,0,,{\\fscx115\\fscy115\\t(0,80,\\fscx100\\fscy100)}HOOK PHRASE HERE."
        ));
        assert!(ass.contains(",Body,,0,0,0,,{\\fscx115\\fscy115\\t(0,80,\\fscx100\\fscy100)}EXTRA"));
        assert!(ass.contains("}FOLLOWS\n"));
        assert_eq!(ass.matches("Dialogue:").count(), 5);
    }

    #[test]
    fn test_to_ass_is_deterministic() {
        let a = track("The same script, twice.", None, 7.5).to_ass();
        let b = track("The same script, twice.", None, 7.5).to_ass();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_alignment() {
        let words = vec![
            WordTiming {
                word: "Listen".to_string(),
                start: 0.0,
                end: 0.5,
            },
            WordTiming {
                word: "now.".to_string(),
                start: 0.6,
                end: 1.0,
            },
        ];
        let track = SubtitleTrack::from_alignment(
            &words,
            None,
            &SubtitleStyleSettings::default(),
            &FrameSettings::default(),
        )
        .unwrap();
        assert_eq!(track.mode(), SubtitleMode::Aligned);
        assert_eq!(track.entries().len(), 2);
        assert!(track.to_ass().contains("\\alpha&HFF&"));
    }

    #[test]
    fn test_from_alignment_rejects_empty_or_invalid() {
        let style = SubtitleStyleSettings::default();
        let frame = FrameSettings::default();
        assert!(SubtitleTrack::from_alignment(&[], None, &style, &frame).is_err());

        let words = vec![WordTiming {
            word: "bad".to_string(),
            start: 2.0,
            end: 1.0,
        }];
        assert!(SubtitleTrack::from_alignment(&words, None, &style, &frame).is_err());
    }

    #[test]
    fn test_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captions.ass");
        let track = track("Write me.", None, 2.0);
        track.write(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), track.to_ass());
    }
}
