use crate::component::caption_timing::CaptionSegment;
use std::fmt::Write;

/// 秒數轉為 SRT 時間格式 `HH:MM:SS,mmm`
#[must_use]
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1000;
    let ms = total_ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// 除錯用的 SRT 字幕，以實際顯示時間輸出
#[must_use]
pub fn to_srt(segments: &[CaptionSegment]) -> String {
    let mut srt = String::new();
    for (index, segment) in segments.iter().enumerate() {
        let _ = writeln!(srt, "{}", index + 1);
        let _ = writeln!(
            srt,
            "{} --> {}",
            format_srt_time(segment.display_start()),
            format_srt_time(segment.end_time())
        );
        let _ = writeln!(srt, "{}", segment.text);
        let _ = writeln!(srt);
    }
    srt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::caption_timing::CaptionRole;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(3661.5), "01:01:01,500");
    }

    #[test]
    fn test_to_srt() {
        let segments = vec![CaptionSegment {
            text: "Hello".to_string(),
            start_time: 1.0,
            duration: 0.5,
            role: CaptionRole::Body,
            lead_in: 0.15,
        }];
        assert_eq!(to_srt(&segments), "1\n00:00:00,850 --> 00:00:01,500\nHello\n\n");
    }
}
