mod ffprobe_info;
mod media_scanner;
mod path_validator;
mod progress;
mod transcoder;

pub use ffprobe_info::probe_duration;
pub use media_scanner::{scan_job_files, scan_video_files};
pub use path_validator::{ensure_directory_exists, require_artifact, validate_path_exists};
pub use progress::{DIAGNOSTIC_TAIL_BYTES, DIAGNOSTIC_TAIL_LINES, DiagnosticTail, ProgressParser};
pub use transcoder::{FfmpegTranscoder, Transcoder};
