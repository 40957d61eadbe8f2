/// 偵測到的 hook 範圍（腳本開頭的前 N 個字）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSpan {
    pub word_count: usize,
    /// 腳本原文中對應的字串（保留原本的大小寫與標點）
    pub text: String,
}

/// 與 `\w` 相同的字元判斷
#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 合併連續空白並去除頭尾空白
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 字中的有效字元數（不含標點）
#[must_use]
pub fn word_char_count(word: &str) -> usize {
    word.chars().filter(|&c| is_word_char(c)).count()
}

/// 小寫並移除非文字字元
#[must_use]
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|&c| is_word_char(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// 以正規化後的逐字比對判斷腳本是否以 hook 開頭
///
/// 只有標點的字（例如破折號）在比對時略過，但仍計入字數，
/// 確保回傳的範圍能直接切割原始字列
///
/// 只比對完整的字：hook 停在字的中間（"The" 對 "There"）不算符合，
/// 避免同一個字被拆成 hook 與內文兩段字幕
#[must_use]
pub fn detect_hook(script_words: &[&str], hook: &str) -> Option<HookSpan> {
    let hook_tokens: Vec<String> = hook
        .split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect();

    if hook_tokens.is_empty() {
        return None;
    }

    let mut matched = 0;
    for (index, word) in script_words.iter().enumerate() {
        let normalized = normalize_word(word);
        if normalized.is_empty() {
            continue;
        }
        if normalized != hook_tokens[matched] {
            return None;
        }
        matched += 1;
        if matched == hook_tokens.len() {
            let word_count = index + 1;
            return Some(HookSpan {
                word_count,
                text: script_words[..word_count].join(" "),
            });
        }
    }

    None
}
