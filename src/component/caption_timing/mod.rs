//! 字幕時間分配元件
//!
//! 純函式：輸入腳本、hook 與旁白長度，輸出依時間排序的字幕段落

mod allocator;
mod hook_detector;

pub use allocator::{CaptionRole, CaptionSegment, allocate_captions};
pub use hook_detector::{
    HookSpan, clean_text, detect_hook, is_word_char, normalize_word, word_char_count,
};
