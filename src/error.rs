use std::path::PathBuf;
use thiserror::Error;

/// 合成引擎的錯誤分類
///
/// 每個變體對應一種失敗階段，呼叫端可依 [`ComposeError::kind`] 決定是否改用其他素材重試
#[derive(Debug, Error)]
pub enum ComposeError {
    /// 無法取得必要輸入的長度
    #[error("無法取得媒體長度 {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },

    /// 規劃階段失敗（尚未啟動任何外部程序）
    #[error("合成規劃失敗: {0}")]
    Planning(String),

    /// 轉碼器結束碼非 0，或宣告的輸出檔不存在
    #[error("轉碼失敗 (exit code: {exit_code:?})")]
    Render {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    /// 預期存在的中間檔案不存在
    #[error("找不到中間檔案: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// 收到中斷訊號
    #[error("操作已取消")]
    Cancelled,

    #[error("檔案操作失敗 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ComposeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn probe(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 穩定的錯誤類別字串，寫入 outcome JSON 使用
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Probe { .. } => "probe_failure",
            Self::Planning(_) => "planning_failure",
            Self::Render { .. } => "render_failure",
            Self::ArtifactMissing(_) => "artifact_missing",
            Self::Cancelled => "cancelled",
            Self::Io { .. } => "io_failure",
        }
    }

    /// 轉碼器 stderr 尾段（僅 Render 失敗時有值）
    #[must_use]
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Self::Render { diagnostics, .. } if !diagnostics.is_empty() => {
                Some(diagnostics.as_str())
            }
            _ => None,
        }
    }

    /// 是否值得改用其他視覺來源重試
    #[must_use]
    pub const fn is_recoverable_with_other_source(&self) -> bool {
        matches!(self, Self::Planning(_) | Self::Render { .. } | Self::Probe { .. })
    }
}

pub type ComposeResult<T> = Result<T, ComposeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings() {
        assert_eq!(ComposeError::probe("/a.mp3", "x").kind(), "probe_failure");
        assert_eq!(ComposeError::Planning("x".into()).kind(), "planning_failure");
        assert_eq!(ComposeError::Cancelled.kind(), "cancelled");
        assert_eq!(
            ComposeError::ArtifactMissing(PathBuf::from("/a.ass")).kind(),
            "artifact_missing"
        );
    }

    #[test]
    fn test_diagnostics_only_for_render() {
        let err = ComposeError::Render {
            exit_code: Some(1),
            diagnostics: "Invalid argument".to_string(),
        };
        assert_eq!(err.diagnostics(), Some("Invalid argument"));
        assert!(ComposeError::Cancelled.diagnostics().is_none());
        assert!(!ComposeError::Cancelled.is_recoverable_with_other_source());
    }
}
