use crate::error::{ComposeError, ComposeResult};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;

/// 待分配的視覺素材
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSource {
    pub path: PathBuf,
    /// 相對權重，未指定時取其他素材權重的平均
    pub weight: Option<f64>,
    /// 素材本身長度，靜態圖片為 None
    pub source_duration: Option<f64>,
    /// 呼叫端要求循環
    pub force_loop: bool,
}

/// 素材在時間軸上分到的時間槽
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSlot {
    pub path: PathBuf,
    pub duration: f64,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub still_image: bool,
}

fn round_ms(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// 依權重分配每個素材的時間槽
///
/// 非最後一段取到毫秒，最後一段吸收剩餘時間，總和等於旁白長度；
/// 素材短於時間槽（或為靜態圖片）時標記為循環
pub fn plan_segment_sequence(
    sources: &[SegmentSource],
    narration_duration: f64,
) -> ComposeResult<Vec<SegmentSlot>> {
    if sources.is_empty() {
        return Err(ComposeError::Planning("素材列表為空".to_string()));
    }
    if !narration_duration.is_finite() || narration_duration <= 0.0 {
        return Err(ComposeError::Planning(format!(
            "旁白長度必須大於 0: {narration_duration}"
        )));
    }

    for source in sources {
        if let Some(weight) = source.weight
            && (!weight.is_finite() || weight <= 0.0)
        {
            return Err(ComposeError::Planning(format!(
                "素材權重必須大於 0: {} ({weight})",
                source.path.display()
            )));
        }
    }

    let explicit: Vec<f64> = sources.iter().filter_map(|s| s.weight).collect();
    let default_weight = if explicit.is_empty() {
        1.0
    } else {
        explicit.iter().sum::<f64>() / explicit.len() as f64
    };
    let weights: Vec<f64> = sources
        .iter()
        .map(|s| s.weight.unwrap_or(default_weight))
        .collect();
    let total_weight: f64 = weights.iter().sum();

    let last = sources.len() - 1;
    let mut allocated = 0.0;
    let mut slots = Vec::with_capacity(sources.len());

    for (index, (source, weight)) in sources.iter().zip(&weights).enumerate() {
        let duration = if index == last {
            narration_duration - allocated
        } else {
            round_ms(narration_duration * weight / total_weight)
        };

        if duration <= 0.0 {
            return Err(ComposeError::Planning(format!(
                "素材時間槽過短: {} ({duration:.4}s)",
                source.path.display()
            )));
        }
        allocated += duration;

        let still_image = source.source_duration.is_none();
        let looped = source.force_loop
            || source
                .source_duration
                .is_none_or(|source_duration| source_duration < duration);

        debug!(
            "素材 {index}: {} -> {duration:.3}s (loop={looped})",
            source.path.display()
        );

        slots.push(SegmentSlot {
            path: source.path.clone(),
            duration,
            looped,
            still_image,
        });
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(path: &str, duration: f64) -> SegmentSource {
        SegmentSource {
            path: PathBuf::from(path),
            weight: None,
            source_duration: Some(duration),
            force_loop: false,
        }
    }

    fn image(path: &str) -> SegmentSource {
        SegmentSource {
            path: PathBuf::from(path),
            weight: None,
            source_duration: None,
            force_loop: false,
        }
    }

    #[test]
    fn test_slots_sum_to_narration() {
        for count in 1..=12 {
            for duration in [1.0, 7.77, 10.0, 33.333, 59.9] {
                let sources: Vec<SegmentSource> =
                    (0..count).map(|i| video(&format!("/v{i}.mp4"), 100.0)).collect();
                let slots = plan_segment_sequence(&sources, duration).unwrap();
                let total: f64 = slots.iter().map(|s| s.duration).sum();
                assert_eq!(slots.len(), count);
                assert!((total - duration).abs() <= 0.001, "n={count} D={duration}");
            }
        }
    }

    #[test]
    fn test_equal_share() {
        let sources = vec![video("/a.mp4", 10.0), video("/b.mp4", 10.0), video("/c.mp4", 10.0)];
        let slots = plan_segment_sequence(&sources, 10.0).unwrap();
        assert!((slots[0].duration - 3.333).abs() < 1e-9);
        assert!((slots[1].duration - 3.333).abs() < 1e-9);
        assert!((slots[2].duration - 3.334).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_share() {
        let mut a = video("/a.mp4", 100.0);
        a.weight = Some(3.0);
        let mut b = video("/b.mp4", 100.0);
        b.weight = Some(1.0);
        let slots = plan_segment_sequence(&[a, b], 8.0).unwrap();
        assert!((slots[0].duration - 6.0).abs() < 1e-9);
        assert!((slots[1].duration - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_sources_loop() {
        let sources = vec![video("/short.mp4", 1.0), video("/long.mp4", 30.0), image("/still.png")];
        let slots = plan_segment_sequence(&sources, 9.0).unwrap();
        assert!(slots[0].looped);
        assert!(!slots[1].looped);
        assert!(slots[2].looped);
        assert!(slots[2].still_image);
    }

    #[test]
    fn test_force_loop() {
        let mut source = video("/long.mp4", 30.0);
        source.force_loop = true;
        let slots = plan_segment_sequence(&[source], 5.0).unwrap();
        assert!(slots[0].looped);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(plan_segment_sequence(&[], 5.0).is_err());

        let mut bad = video("/a.mp4", 10.0);
        bad.weight = Some(0.0);
        assert!(plan_segment_sequence(&[bad], 5.0).is_err());

        assert!(plan_segment_sequence(&[video("/a.mp4", 10.0)], 0.0).is_err());
    }
}
