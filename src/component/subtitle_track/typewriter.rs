use super::ass_document::{escape_ass_text, format_caption_text, pop_tag};
use super::SubtitleEntry;
use crate::component::caption_timing::{CaptionRole, CaptionSegment, detect_hook, is_word_char};
use crate::config::SubtitleStyleSettings;
use crate::error::{ComposeError, ComposeResult};
use serde::{Deserialize, Serialize};

/// 外部對齊工具提供的逐字時間
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// 檢查對齊資料：時間須為有限非負數、start <= end、依開始時間排序
pub fn validate_alignment(words: &[WordTiming]) -> ComposeResult<()> {
    let mut previous_start = 0.0;
    for (index, w) in words.iter().enumerate() {
        if !w.start.is_finite() || !w.end.is_finite() || w.start < 0.0 || w.end < w.start {
            return Err(ComposeError::Planning(format!(
                "對齊資料第 {index} 個字時間無效: {:?} [{}, {}]",
                w.word, w.start, w.end
            )));
        }
        if w.start < previous_start {
            return Err(ComposeError::Planning(format!(
                "對齊資料未依時間排序: 第 {index} 個字 {:?}",
                w.word
            )));
        }
        previous_start = w.start;
    }
    Ok(())
}

/// 對齊資料轉為字幕段落
///
/// hook 的字合併為第一段（第一個字開始到最後一個字結束），其餘每個字一段
#[must_use]
pub fn segments_from_alignment(
    words: &[WordTiming],
    hook: Option<&str>,
    lead_in: f64,
) -> Vec<CaptionSegment> {
    let texts: Vec<&str> = words.iter().map(|w| w.word.as_str()).collect();
    let hook_span = hook.and_then(|h| detect_hook(&texts, h));
    let hook_words = hook_span.as_ref().map_or(0, |span| span.word_count);

    let mut segments = Vec::with_capacity(words.len() - hook_words + 1);
    if let Some(span) = hook_span {
        let start = words[0].start;
        let end = words[hook_words - 1].end;
        segments.push(CaptionSegment {
            text: span.text,
            start_time: start,
            duration: end - start,
            role: CaptionRole::Hook,
            lead_in,
        });
    }

    segments.extend(words[hook_words..].iter().map(|w| CaptionSegment {
        text: w.word.clone(),
        start_time: w.start,
        duration: w.end - w.start,
        role: CaptionRole::Body,
        lead_in,
    }));
    segments
}

/// 逐字母顯示的字幕條目
///
/// hook 字沿用彈出動畫；內文每個字母從透明切換為不透明，
/// 間隔為 min(typewriter_step_ms, 字長時間 / 字母數)
#[must_use]
pub fn typewriter_entries(
    segments: &[CaptionSegment],
    style: &SubtitleStyleSettings,
) -> Vec<SubtitleEntry> {
    segments
        .iter()
        .filter_map(|segment| {
            let start = segment.display_start();
            let end = segment.end_time();
            let markup = match segment.role {
                CaptionRole::Hook => {
                    let text = format_caption_text(&segment.text, CaptionRole::Hook, style);
                    format!("{}{text}", pop_tag(style))
                }
                CaptionRole::Body => letter_reveal(&segment.text, (end - start) * 1000.0, style)?,
            };
            Some(SubtitleEntry {
                start,
                end,
                role: segment.role,
                markup,
            })
        })
        .collect()
}

fn letter_reveal(word: &str, duration_ms: f64, style: &SubtitleStyleSettings) -> Option<String> {
    // 先處理大小寫與標點，跳脫留到逐字母組裝時
    let letters: Vec<char> = unescaped_body_text(word, style).chars().collect();
    if letters.is_empty() {
        return None;
    }

    let step = f64::from(style.typewriter_step_ms).min(duration_ms / letters.len() as f64);
    let markup = letters
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let delay = (i as f64 * step).round() as u64;
            format!(
                "{{\\alpha&HFF&\\t({delay},{},\\alpha&H00&)}}{}",
                delay + 1,
                escape_ass_text(&c.to_string())
            )
        })
        .collect();
    Some(markup)
}

fn unescaped_body_text(word: &str, style: &SubtitleStyleSettings) -> String {
    let mut text: String = if style.strip_body_punctuation {
        word.chars().filter(|&c| is_word_char(c)).collect()
    } else {
        word.to_string()
    };
    if style.uppercase_body {
        text = text.to_uppercase();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(word: &str, start: f64, end: f64) -> WordTiming {
        WordTiming {
            word: word.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_validate_alignment() {
        assert!(validate_alignment(&[timing("a", 0.0, 0.5), timing("b", 0.5, 1.0)]).is_ok());
        assert!(validate_alignment(&[timing("a", 0.5, 0.2)]).is_err());
        assert!(validate_alignment(&[timing("a", -0.1, 0.2)]).is_err());
        assert!(validate_alignment(&[timing("a", 1.0, 1.2), timing("b", 0.5, 0.7)]).is_err());
        assert!(validate_alignment(&[timing("a", f64::NAN, 1.0)]).is_err());
    }

    #[test]
    fn test_segments_from_alignment_merges_hook_words() {
        let words = vec![
            timing("Listen", 0.1, 0.4),
            timing("closely.", 0.4, 1.0),
            timing("It", 1.2, 1.4),
            timing("began", 1.4, 1.9),
        ];
        let segments = segments_from_alignment(&words, Some("Listen closely"), 0.1);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].role, CaptionRole::Hook);
        assert_eq!(segments[0].text, "Listen closely.");
        assert!((segments[0].start_time - 0.1).abs() < 1e-9);
        assert!((segments[0].end_time() - 1.0).abs() < 1e-9);
        assert!(segments[1..].iter().all(|s| s.role == CaptionRole::Body));
        assert!((segments[2].duration - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_hook_entry_uses_pop_tag() {
        let style = SubtitleStyleSettings::default();
        let words = vec![
            timing("Wait", 0.0, 0.3),
            timing("for", 0.3, 0.5),
            timing("it", 0.5, 0.8),
            timing("now", 1.0, 1.3),
        ];
        let segments = segments_from_alignment(&words, Some("Wait for it"), 0.1);
        let entries = typewriter_entries(&segments, &style);
        assert_eq!(
            entries.iter().filter(|e| e.role == CaptionRole::Hook).count(),
            1
        );
        assert!(entries[0].markup.starts_with(&pop_tag(&style)));
        assert!(entries[0].markup.ends_with("WAIT FOR IT"));
        assert!(entries[1].markup.contains("\\alpha&HFF&"));
    }

    #[test]
    fn test_letter_reveal_markup() {
        let style = SubtitleStyleSettings::default();
        let markup = letter_reveal("hi!", 1000.0, &style).unwrap();
        assert_eq!(
            markup,
            "{\\alpha&HFF&\\t(0,1,\\alpha&H00&)}H{\\alpha&HFF&\\t(50,51,\\alpha&H00&)}I"
        );
    }

    #[test]
    fn test_letter_reveal_step_shrinks_for_short_words() {
        let style = SubtitleStyleSettings::default();
        // 4 個字母、100ms → 每個字母 25ms
        let markup = letter_reveal("abcd", 100.0, &style).unwrap();
        assert!(markup.contains("\\t(25,26,"));
        assert!(markup.contains("\\t(75,76,"));
    }

    #[test]
    fn test_typewriter_entries_skip_punctuation_only_words() {
        let style = SubtitleStyleSettings::default();
        let segments = segments_from_alignment(
            &[timing("—", 0.0, 0.2), timing("word", 0.2, 0.8)],
            None,
            0.1,
        );
        let entries = typewriter_entries(&segments, &style);
        assert_eq!(entries.len(), 1);
        assert!((entries[0].start - 0.1).abs() < 1e-9);
        assert!((entries[0].end - 0.8).abs() < 1e-9);
    }
}
