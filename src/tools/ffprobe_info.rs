use crate::error::{ComposeError, ComposeResult};
use log::debug;
use std::path::Path;
use std::process::Command;

/// 使用 ffprobe 取得媒體長度（秒）
///
/// 成功條件：exit code 0 且標準輸出為非空的十進位秒數
pub fn probe_duration(ffprobe: &str, path: &Path) -> ComposeResult<f64> {
    if !path.exists() {
        return Err(ComposeError::probe(path, "檔案不存在"));
    }

    debug!("ffprobe 取得長度: {}", path.display());

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-show_entries", "format=duration", "-of", "csv=p=0", "-i"])
        .arg(path)
        .output()
        .map_err(|e| ComposeError::probe(path, format!("無法執行 ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ComposeError::probe(
            path,
            format!("ffprobe 執行失敗 ({}): {}", output.status, stderr.trim()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_duration_output(&stdout)
        .ok_or_else(|| ComposeError::probe(path, format!("無法解析 ffprobe 輸出: {:?}", stdout.trim())))
}

/// 解析 `csv=p=0` 格式的長度輸出（例如 "12.345000"）
///
/// 空字串、`N/A`、非正數都視為失敗
pub(crate) fn parse_duration_output(stdout: &str) -> Option<f64> {
    let value = stdout.lines().map(str::trim).find(|line| !line.is_empty())?;
    let seconds: f64 = value.parse().ok()?;
    (seconds.is_finite() && seconds > 0.0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_output() {
        assert!((parse_duration_output("12.345000\n").unwrap() - 12.345).abs() < 1e-9);
        assert!((parse_duration_output("\n  8.0  \n").unwrap() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_duration_output_invalid() {
        assert!(parse_duration_output("").is_none());
        assert!(parse_duration_output("N/A").is_none());
        assert!(parse_duration_output("0.000000").is_none());
        assert!(parse_duration_output("-3.0").is_none());
    }

    #[test]
    fn test_probe_missing_file() {
        let err = probe_duration("ffprobe", Path::new("/definitely/not/here.mp3")).unwrap_err();
        assert_eq!(err.kind(), "probe_failure");
    }
}
