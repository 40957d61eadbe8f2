use super::hook_detector::{HookSpan, clean_text, detect_hook, word_char_count};
use crate::config::CaptionTimingSettings;
use crate::error::{ComposeError, ComposeResult};
use log::{debug, warn};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionRole {
    Hook,
    Body,
}

/// 一段字幕的時間槽
///
/// `start_time` / `duration` 為時間軸上的配置，所有段落的 duration 總和等於旁白長度；
/// 實際顯示時間由 [`CaptionSegment::display_start`] 提前 `lead_in` 秒，結束時間不變
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionSegment {
    pub text: String,
    pub start_time: f64,
    pub duration: f64,
    pub role: CaptionRole,
    pub lead_in: f64,
}

impl CaptionSegment {
    #[must_use]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    #[must_use]
    pub fn display_start(&self) -> f64 {
        (self.start_time - self.lead_in).max(0.0)
    }
}

/// 內文中的一個字與其後的停頓權重
#[derive(Debug, Clone)]
struct BodyWord {
    text: String,
    weight: usize,
    pause: f64,
}

/// 依旁白長度為腳本分配逐字字幕時間
///
/// 流程：
/// 1. 偵測 hook，時長依字元比例計算後限制在 [hook_min, hook_max]
/// 2. 依逗號與句尾符號估計停頓總和（上限為內文時長的 max_silence_ratio）
/// 3. 剩餘的說話時間依每個字的字元數分配
/// 4. 套用最短時長，超出的部分由時間軸尾端吸收
pub fn allocate_captions(
    script: &str,
    hook: Option<&str>,
    total_duration: f64,
    settings: &CaptionTimingSettings,
) -> ComposeResult<Vec<CaptionSegment>> {
    if !total_duration.is_finite() || total_duration <= 0.0 {
        return Err(ComposeError::Planning(format!(
            "旁白長度必須大於 0: {total_duration}"
        )));
    }

    let full_text = clean_text(script);
    if full_text.is_empty() {
        return Ok(Vec::new());
    }

    let words: Vec<&str> = full_text.split(' ').collect();
    let hook_span = hook.and_then(|h| detect_hook(&words, h));
    let body_words = hook_span
        .as_ref()
        .map_or(&words[..], |span| &words[span.word_count..]);

    let mut segments = Vec::with_capacity(body_words.len() + 1);
    let mut cursor = 0.0;

    if let Some(span) = &hook_span {
        // 只有 hook 時仍維持 [hook_min, hook_max]，不拉長到整段旁白
        let hook_duration = hook_duration(span, &full_text, total_duration, settings);

        debug!("偵測到 hook ({} 字): {hook_duration:.2}s", span.word_count);

        segments.push(CaptionSegment {
            text: span.text.clone(),
            start_time: 0.0,
            duration: hook_duration,
            role: CaptionRole::Hook,
            lead_in: 0.0,
        });
        cursor = hook_duration;
    }

    if body_words.is_empty() {
        return Ok(segments);
    }

    let budget = total_duration - cursor;
    if budget <= f64::EPSILON {
        warn!("旁白長度 {total_duration:.2}s 不足以顯示內文字幕，只保留 hook");
        return Ok(segments);
    }

    segments.extend(allocate_body(body_words, cursor, budget, settings));
    Ok(segments)
}

fn hook_duration(
    span: &HookSpan,
    full_text: &str,
    total_duration: f64,
    settings: &CaptionTimingSettings,
) -> f64 {
    let hook_chars = span.text.chars().count() as f64;
    let total_chars = full_text.chars().count() as f64;
    let proportional = hook_chars / total_chars * total_duration;

    proportional
        .clamp(settings.hook_min, settings.hook_max)
        .min(total_duration)
}

/// 純標點的 token 併入前一個字（開頭則併入下一個字）
fn tokenize_body(words: &[&str], settings: &CaptionTimingSettings) -> Vec<BodyWord> {
    let mut tokens: Vec<String> = Vec::with_capacity(words.len());
    let mut pending_prefix = String::new();

    for word in words {
        if word_char_count(word) == 0 {
            match tokens.last_mut() {
                Some(last) => last.push_str(word),
                None => pending_prefix.push_str(word),
            }
            continue;
        }
        let mut token = std::mem::take(&mut pending_prefix);
        token.push_str(word);
        tokens.push(token);
    }

    if tokens.is_empty() && !pending_prefix.is_empty() {
        tokens.push(pending_prefix);
    }

    tokens
        .into_iter()
        .map(|text| {
            let pause = pause_weight(&text, settings);
            BodyWord {
                weight: word_char_count(&text),
                pause,
                text,
            }
        })
        .collect()
}

/// 字後停頓權重：每個逗號 comma_pause，每組連續的 `.!?` 算一次 terminator_pause
fn pause_weight(word: &str, settings: &CaptionTimingSettings) -> f64 {
    let commas = word.chars().filter(|&c| c == ',').count();

    let mut terminator_runs = 0;
    let mut in_run = false;
    for c in word.chars() {
        let is_terminator = matches!(c, '.' | '!' | '?');
        if is_terminator && !in_run {
            terminator_runs += 1;
        }
        in_run = is_terminator;
    }

    commas as f64 * settings.comma_pause + f64::from(terminator_runs) * settings.terminator_pause
}

fn allocate_body(
    words: &[&str],
    offset: f64,
    budget: f64,
    settings: &CaptionTimingSettings,
) -> Vec<CaptionSegment> {
    let body = tokenize_body(words, settings);
    let count = body.len();

    let pause_total: f64 = body.iter().map(|w| w.pause).sum();
    let silence = (budget * settings.max_silence_ratio).min(pause_total);
    let pause_scale = if pause_total > 0.0 {
        silence / pause_total
    } else {
        0.0
    };
    let active_speech = budget - silence;

    // 全部都是標點時改為平均分配
    let total_weight: usize = body.iter().map(|w| w.weight).sum();
    let weight_of = |w: &BodyWord| {
        if total_weight == 0 {
            1.0 / count as f64
        } else {
            w.weight as f64 / total_weight as f64
        }
    };

    debug!(
        "內文 {count} 字: 預算 {budget:.2}s, 停頓 {silence:.2}s, 說話 {active_speech:.2}s"
    );

    // 字太多時最短時長降為平均值，確保總和仍可等於預算
    let floor = settings.min_segment_duration.min(budget / count as f64);
    let mut durations: Vec<f64> = body
        .iter()
        .map(|w| (weight_of(w) * active_speech + w.pause * pause_scale).max(floor))
        .collect();

    absorb_overshoot(&mut durations, budget, floor);

    let end_of_budget = offset + budget;
    let mut cursor = offset;
    body.into_iter()
        .zip(durations)
        .enumerate()
        .map(|(index, (word, duration))| {
            // 最後一段對齊旁白結尾，消除浮點累積誤差
            let duration = if index + 1 == count {
                (end_of_budget - cursor).max(0.0)
            } else {
                duration
            };
            let segment = CaptionSegment {
                text: word.text,
                start_time: cursor,
                duration,
                role: CaptionRole::Body,
                lead_in: settings.lead_in,
            };
            cursor += duration;
            segment
        })
        .collect()
}

/// 最短時長造成的超出量由尾端往前扣除，每段不低於 floor
fn absorb_overshoot(durations: &mut [f64], budget: f64, floor: f64) {
    let mut overshoot = durations.iter().sum::<f64>() - budget;
    for duration in durations.iter_mut().rev() {
        if overshoot <= 0.0 {
            break;
        }
        let take = (*duration - floor).max(0.0).min(overshoot);
        *duration -= take;
        overshoot -= take;
    }
}
