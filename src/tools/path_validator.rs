use crate::error::{ComposeError, ComposeResult};
use anyhow::{Result, bail};
use std::path::Path;

pub fn validate_path_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> ComposeResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| ComposeError::io(path, e))?;
    }
    Ok(())
}

/// 確認中間檔案存在，否則回傳 `ArtifactMissing`
pub fn require_artifact(path: &Path) -> ComposeResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ComposeError::ArtifactMissing(path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_require_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("captions.ass");
        assert!(matches!(
            require_artifact(&file),
            Err(ComposeError::ArtifactMissing(_))
        ));

        std::fs::write(&file, "[Script Info]").unwrap();
        assert!(require_artifact(&file).is_ok());
        // 資料夾不算中間檔案
        assert!(require_artifact(temp_dir.path()).is_err());
    }

    #[test]
    fn test_ensure_directory_exists() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_directory_exists(&nested).unwrap();
    }
}
