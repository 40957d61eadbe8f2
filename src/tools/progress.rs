use regex::Regex;
use std::collections::VecDeque;

/// 保留的 stderr 行數上限
pub const DIAGNOSTIC_TAIL_LINES: usize = 40;
/// 保留的 stderr 位元組上限
pub const DIAGNOSTIC_TAIL_BYTES: usize = 4000;

/// 解析 ffmpeg stderr 中的 `time=HH:MM:SS.cc` 進度
pub struct ProgressParser {
    time_regex: Regex,
}

impl ProgressParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            time_regex: Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)")?,
        })
    }

    /// 回傳該行的進度秒數，沒有 `time=` 時回傳 None
    #[must_use]
    pub fn parse_time(&self, line: &str) -> Option<f64> {
        let caps = self.time_regex.captures_iter(line).last()?;
        let h: f64 = caps.get(1)?.as_str().parse().ok()?;
        let m: f64 = caps.get(2)?.as_str().parse().ok()?;
        let s: f64 = caps.get(3)?.as_str().parse().ok()?;
        Some(h * 3600.0 + m * 60.0 + s)
    }
}

/// stderr 尾段緩衝
#[derive(Debug, Default)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
}

impl DiagnosticTail {
    pub fn push(&mut self, line: &str) {
        let line = line.trim_end();
        if line.is_empty() {
            return;
        }
        if self.lines.len() == DIAGNOSTIC_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line.to_string());
    }

    /// 合併為單一字串，超過位元組上限時只保留最後的部分
    #[must_use]
    pub fn into_string(self) -> String {
        let joined = self.lines.into_iter().collect::<Vec<_>>().join("\n");
        if joined.len() <= DIAGNOSTIC_TAIL_BYTES {
            return joined;
        }
        let mut start = joined.len() - DIAGNOSTIC_TAIL_BYTES;
        while !joined.is_char_boundary(start) {
            start += 1;
        }
        joined[start..].to_string()
    }
}
