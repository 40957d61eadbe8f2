use crate::component::caption_timing::{CaptionRole, is_word_char};
use crate::config::{FrameSettings, SubtitleStyleSettings};
use std::fmt::Write;

pub const HOOK_STYLE: &str = "Hook";
pub const BODY_STYLE: &str = "Body";

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

#[must_use]
pub const fn style_name(role: CaptionRole) -> &'static str {
    match role {
        CaptionRole::Hook => HOOK_STYLE,
        CaptionRole::Body => BODY_STYLE,
    }
}

/// 秒數轉為 ASS 時間格式 `H:MM:SS.cc`（百分之一秒）
#[must_use]
pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let h = total_cs / 360_000;
    let m = (total_cs % 360_000) / 6_000;
    let s = (total_cs % 6_000) / 100;
    let cs = total_cs % 100;
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

/// 跳脫 ASS 文字中具特殊意義的字元
///
/// `{` `}` 會開啟覆寫區塊，反斜線會組成控制碼（`\N` 等），換行改為 `\N`
#[must_use]
pub fn escape_ass_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => escaped.push_str("\\{"),
            '}' => escaped.push_str("\\}"),
            '\\' => escaped.push('＼'),
            '\n' => escaped.push_str("\\N"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// 依設定處理大小寫與標點：hook 一律大寫，內文依 `uppercase_body` / `strip_body_punctuation`
#[must_use]
pub fn format_caption_text(text: &str, role: CaptionRole, style: &SubtitleStyleSettings) -> String {
    let text = match role {
        CaptionRole::Hook => text.to_uppercase(),
        CaptionRole::Body => {
            let mut body = if style.strip_body_punctuation {
                text.chars().filter(|&c| is_word_char(c)).collect()
            } else {
                text.to_string()
            };
            if body.is_empty() {
                body = text.to_string();
            }
            if style.uppercase_body {
                body.to_uppercase()
            } else {
                body
            }
        }
    };
    escape_ass_text(&text)
}

/// 「蓋章」彈出動畫：從 pop_scale% 縮回 100%
#[must_use]
pub fn pop_tag(style: &SubtitleStyleSettings) -> String {
    format!(
        "{{\\fscx{scale}\\fscy{scale}\\t(0,{ms},\\fscx100\\fscy100)}}",
        scale = style.pop_scale,
        ms = style.pop_duration_ms
    )
}

/// 產生 `[Script Info]` 與 `[V4+ Styles]` 區段
#[must_use]
pub fn build_header(style: &SubtitleStyleSettings, frame: &FrameSettings) -> String {
    let mut header = String::new();
    let _ = writeln!(header, "[Script Info]");
    let _ = writeln!(header, "ScriptType: v4.00+");
    let _ = writeln!(header, "PlayResX: {}", frame.width);
    let _ = writeln!(header, "PlayResY: {}", frame.height);
    let _ = writeln!(header, "WrapStyle: 1");
    let _ = writeln!(header, "ScaledBorderAndShadow: yes");
    let _ = writeln!(header);
    let _ = writeln!(header, "[V4+ Styles]");
    let _ = writeln!(header, "{STYLE_FORMAT}");
    let _ = writeln!(
        header,
        "{}",
        style_line(BODY_STYLE, style.body_font_size, style.body_outline, style)
    );
    let _ = writeln!(
        header,
        "{}",
        style_line(HOOK_STYLE, style.hook_font_size, style.hook_outline, style)
    );
    let _ = writeln!(header);
    let _ = writeln!(header, "[Events]");
    let _ = writeln!(header, "{EVENT_FORMAT}");
    header
}

fn style_line(name: &str, font_size: u32, outline: u32, style: &SubtitleStyleSettings) -> String {
    format!(
        "Style: {name},{font},{font_size},{primary},&H000000FF,{outline_colour},&H00000000,-1,0,0,0,100,100,0,0,1,{outline},0,{alignment},10,10,{margin_v},1",
        font = style.font_name,
        primary = style.primary_colour,
        outline_colour = style.outline_colour,
        alignment = style.alignment,
        margin_v = style.margin_v,
    )
}

#[must_use]
pub fn dialogue_line(start: f64, end: f64, role: CaptionRole, markup: &str) -> String {
    format!(
        "Dialogue: 0,{},{},{},,0,0,0,,{markup}",
        format_ass_time(start),
        format_ass_time(end),
        style_name(role)
    )
}
