mod background;
mod segment_sequence;

pub use background::{BackgroundPlan, plan_background};
pub use segment_sequence::{SegmentSlot, SegmentSource, plan_segment_sequence};

use serde::Serialize;

/// 視覺素材與旁白長度協調後的結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VisualPlan {
    Background(BackgroundPlan),
    SegmentSequence { segments: Vec<SegmentSlot> },
}

impl VisualPlan {
    /// 計畫覆蓋的總長度
    #[must_use]
    pub fn total_duration(&self) -> f64 {
        match self {
            Self::Background(plan) => plan.duration,
            Self::SegmentSequence { segments } => segments.iter().map(|s| s.duration).sum(),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Background(plan) => format!(
                "背景 {} (offset {:.3}s, loop={})",
                plan.source_path.display(),
                plan.start_offset,
                plan.looped
            ),
            Self::SegmentSequence { segments } => format!("{} 段素材串接", segments.len()),
        }
    }
}
