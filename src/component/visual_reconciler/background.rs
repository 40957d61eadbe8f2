use crate::error::{ComposeError, ComposeResult};
use log::info;
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// 單一背景影片的使用方式
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundPlan {
    pub source_path: PathBuf,
    pub source_duration: f64,
    /// 影片中的起始秒數
    pub start_offset: f64,
    /// 使用長度，永遠等於旁白長度
    pub duration: f64,
    #[serde(rename = "loop")]
    pub looped: bool,
}

impl BackgroundPlan {
    /// 起點之後實際可覆蓋的長度（循環時視為無限）
    #[must_use]
    pub fn covered_duration(&self) -> f64 {
        if self.looped {
            f64::INFINITY
        } else {
            self.source_duration - self.start_offset
        }
    }
}

/// 決定背景影片要裁切或循環
///
/// - 影片比旁白長：在 [0, V - D] 之間隨機挑起點，不循環
/// - 影片不比旁白長：從 0 開始循環直到覆蓋旁白
pub fn plan_background<R: Rng + ?Sized>(
    source_path: &Path,
    source_duration: f64,
    narration_duration: f64,
    rng: &mut R,
) -> ComposeResult<BackgroundPlan> {
    if !narration_duration.is_finite() || narration_duration <= 0.0 {
        return Err(ComposeError::Planning(format!(
            "旁白長度必須大於 0: {narration_duration}"
        )));
    }
    if !source_duration.is_finite() || source_duration <= 0.0 {
        return Err(ComposeError::Planning(format!(
            "背景影片長度無效: {} ({source_duration})",
            source_path.display()
        )));
    }

    let (start_offset, looped) = if source_duration > narration_duration {
        let max_offset = source_duration - narration_duration;
        // 取到毫秒，避免參數出現過長的小數
        let offset = (rng.gen_range(0.0..=max_offset) * 1000.0).floor() / 1000.0;
        info!(
            "背景影片較長 ({source_duration:.2}s > {narration_duration:.2}s)，擷取 {offset:.2}s ~ {:.2}s",
            offset + narration_duration
        );
        (offset.min(max_offset), false)
    } else {
        info!("背景影片較短 ({source_duration:.2}s <= {narration_duration:.2}s)，循環播放");
        (0.0, true)
    };

    Ok(BackgroundPlan {
        source_path: source_path.to_path_buf(),
        source_duration,
        start_offset,
        duration: narration_duration,
        looped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_longer_video_is_trimmed() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let plan = plan_background(Path::new("/bg.mp4"), 20.0, 8.0, &mut rng).unwrap();
            assert!(!plan.looped);
            assert!(plan.start_offset >= 0.0 && plan.start_offset <= 12.0);
            assert!((plan.duration - 8.0).abs() < 1e-9);
            assert!(plan.covered_duration() >= 8.0);
        }
    }

    #[test]
    fn test_shorter_video_loops() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = plan_background(Path::new("/bg.mp4"), 5.0, 8.0, &mut rng).unwrap();
        assert!(plan.looped);
        assert!((plan.start_offset).abs() < 1e-9);
        assert!(plan.covered_duration() >= 8.0);
    }

    #[test]
    fn test_equal_length_loops() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = plan_background(Path::new("/bg.mp4"), 8.0, 8.0, &mut rng).unwrap();
        assert!(plan.looped);
    }

    #[test]
    fn test_same_seed_same_offset() {
        let a = plan_background(Path::new("/bg.mp4"), 60.0, 8.0, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = plan_background(Path::new("/bg.mp4"), 60.0, 8.0, &mut StdRng::seed_from_u64(9))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_durations() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(plan_background(Path::new("/bg.mp4"), 0.0, 8.0, &mut rng).is_err());
        assert!(plan_background(Path::new("/bg.mp4"), 10.0, -1.0, &mut rng).is_err());
    }
}
