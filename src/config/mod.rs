pub mod load;
pub mod types;

pub use types::{
    CaptionTimingSettings, ComposerSettings, Config, EncoderSettings, FrameSettings,
    MediaTypeTable, SubtitleStyleSettings, ThemeSettings, TranscoderSettings,
};
