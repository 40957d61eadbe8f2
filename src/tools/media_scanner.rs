use crate::config::MediaTypeTable;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 掃描背景影片資料夾，依路徑排序以確保同一個種子挑到同一支影片
pub fn scan_video_files(directory: &Path, media_types: &MediaTypeTable) -> Result<Vec<PathBuf>> {
    let mut video_files: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.metadata().is_ok_and(|m| m.len() > 0))
        .filter(|entry| media_types.is_video_file(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    video_files.sort();
    Ok(video_files)
}

/// 列出資料夾第一層的工作檔（*.json，排除 *.outcome.json）
pub fn scan_job_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut job_files: Vec<PathBuf> = WalkDir::new(directory)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_job_file(path))
        .collect();

    job_files.sort();
    Ok(job_files)
}

fn is_job_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.to_lowercase().ends_with(".json")
        && !name.ends_with(".outcome.json")
        && name != "settings.json"
}
