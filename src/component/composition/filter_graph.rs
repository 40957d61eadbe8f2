use crate::component::visual_reconciler::{BackgroundPlan, SegmentSlot};
use crate::config::FrameSettings;
use std::path::Path;

pub const VIDEO_OUT: &str = "vout";
pub const AUDIO_OUT: &str = "aout";

/// 秒數參數統一取到毫秒
#[must_use]
pub fn format_seconds(value: f64) -> String {
    format!("{value:.3}")
}

/// 濾鏡參數中的路徑跳脫：反斜線、單引號、冒號
///
/// 結果放在單引號內。單引號需經過 filtergraph 與濾鏡選項兩層解析，
/// 先結束引號，再以 `\\\'` 讓選項層收到 `\'`
#[must_use]
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('\'', "'\\\\\\''")
        .replace(':', "\\:")
}

fn subtitles_filter(subtitle_path: &Path) -> String {
    format!("subtitles='{}'", escape_filter_path(subtitle_path))
}

/// 背景模式：放大填滿畫面後置中裁切，擷取旁白長度後燒入字幕
#[must_use]
pub fn background_graph(
    plan: &BackgroundPlan,
    frame: &FrameSettings,
    subtitle_path: &Path,
) -> String {
    let FrameSettings { width, height, fps } = *frame;
    format!(
        "[0:v]scale={width}:{height}:force_original_aspect_ratio=increase,crop={width}:{height},setsar=1,fps={fps},trim=duration={duration},setpts=PTS-STARTPTS,{subtitles}[{VIDEO_OUT}]",
        duration = format_seconds(plan.duration),
        subtitles = subtitles_filter(subtitle_path),
    )
}

/// 串接模式：每段縮放加黑邊、裁到時間槽長度，串接後燒入字幕
///
/// 第 i 段素材對應輸入 i
#[must_use]
pub fn segment_graph(slots: &[SegmentSlot], frame: &FrameSettings, subtitle_path: &Path) -> String {
    let FrameSettings { width, height, fps } = *frame;
    let mut filters: Vec<String> = Vec::with_capacity(slots.len() + 2);
    let mut concat_inputs = String::new();

    for (index, slot) in slots.iter().enumerate() {
        filters.push(format!(
            "[{index}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,pad={width}:{height}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps},trim=duration={duration},setpts=PTS-STARTPTS[v{index}]",
            duration = format_seconds(slot.duration),
        ));
        concat_inputs.push_str(&format!("[v{index}]"));
    }

    filters.push(format!(
        "{concat_inputs}concat=n={count}:v=1:a=0[vcat]",
        count = slots.len()
    ));
    filters.push(format!("[vcat]{}[{VIDEO_OUT}]", subtitles_filter(subtitle_path)));

    filters.join(";")
}

/// 旁白音量不是 1.0 時加上 volume 濾鏡
#[must_use]
pub fn audio_filter(audio_input: usize, volume: f64) -> Option<String> {
    if (volume - 1.0).abs() < f64::EPSILON {
        return None;
    }
    Some(format!("[{audio_input}:a]volume={volume}[{AUDIO_OUT}]"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn slot(path: &str, duration: f64) -> SegmentSlot {
        SegmentSlot {
            path: PathBuf::from(path),
            duration,
            looped: false,
            still_image: false,
        }
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path(Path::new("/tmp/job/captions.ass")), "/tmp/job/captions.ass");
        assert_eq!(escape_filter_path(Path::new("C:\\tmp\\a.ass")), "C\\:\\\\tmp\\\\a.ass");
        assert_eq!(
            escape_filter_path(Path::new("/tmp/it's.ass")),
            "/tmp/it'\\\\\\''s.ass"
        );
    }

    #[test]
    fn test_background_graph() {
        let plan = BackgroundPlan {
            source_path: PathBuf::from("/bg.mp4"),
            source_duration: 20.0,
            start_offset: 3.0,
            duration: 8.0,
            looped: false,
        };
        let graph = background_graph(&plan, &FrameSettings::default(), Path::new("/w/captions.ass"));
        assert_eq!(
            graph,
            "[0:v]scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,setsar=1,fps=30,trim=duration=8.000,setpts=PTS-STARTPTS,subtitles='/w/captions.ass'[vout]"
        );
    }

    #[test]
    fn test_segment_graph_concatenates_in_order() {
        let slots = vec![slot("/a.mp4", 3.333), slot("/b.png", 6.667)];
        let graph = segment_graph(&slots, &FrameSettings::default(), Path::new("/w/captions.ass"));

        let chains: Vec<&str> = graph.split(';').collect();
        assert_eq!(chains.len(), 4);
        assert!(chains[0].starts_with("[0:v]scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920"));
        assert!(chains[0].contains("trim=duration=3.333"));
        assert!(chains[1].starts_with("[1:v]"));
        assert!(chains[1].ends_with("[v1]"));
        assert_eq!(chains[2], "[v0][v1]concat=n=2:v=1:a=0[vcat]");
        assert_eq!(chains[3], "[vcat]subtitles='/w/captions.ass'[vout]");
    }

    #[test]
    fn test_audio_filter() {
        assert_eq!(audio_filter(1, 1.0), None);
        assert_eq!(audio_filter(2, 1.5).as_deref(), Some("[2:a]volume=1.5[aout]"));
    }
}
