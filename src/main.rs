use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;
use log::{info, warn};
use narration_composer::component::render_job::{JobOutcome, JobRunner};
use narration_composer::component::Composer;
use narration_composer::config::Config;
use narration_composer::init;
use narration_composer::signal::setup_shutdown_signal;
use narration_composer::tools::{FfmpegTranscoder, scan_job_files, validate_path_exists};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    init::init();
    let shutdown_signal = setup_shutdown_signal()?;
    let config = Config::new()?;

    println!("{}", style("=== 旁白影片合成 ===").cyan().bold());

    let target = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => prompt_target()?,
    };
    validate_path_exists(&target)?;

    let job_files = if target.is_dir() {
        scan_job_files(&target)?
    } else {
        vec![target.clone()]
    };
    if job_files.is_empty() {
        bail!("找不到任何工作檔: {}", target.display());
    }

    // 批次模式多個工作同時執行，不顯示個別進度條
    let single = job_files.len() == 1;
    let transcoder = FfmpegTranscoder::new(&config.settings.transcoder).with_progress(single);
    let composer = Composer::new(
        transcoder,
        config.settings.clone(),
        config.media_types.clone(),
        shutdown_signal,
    );
    let runner = JobRunner::new(composer);

    let outcomes = if single {
        vec![runner.run_file(&job_files[0])]
    } else {
        runner.run_batch(&job_files)?
    };

    print_summary(&outcomes);

    if outcomes.iter().all(JobOutcome::is_success) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn prompt_target() -> Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("請輸入工作檔或工作資料夾路徑")
        .interact_text()?;
    Ok(PathBuf::from(path.trim()))
}

fn print_summary(outcomes: &[JobOutcome]) {
    let completed = outcomes.iter().filter(|o| o.is_success()).count();
    let failed = outcomes.len() - completed;

    println!();
    println!("{}", style("=== 合成結果 ===").cyan().bold());
    for outcome in outcomes {
        if outcome.is_success() {
            let output = outcome
                .output_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let fallback = if outcome.used_fallback { " (備援主題)" } else { "" };
            println!(
                "  {} {} -> {output}{fallback}",
                style("✓").green(),
                outcome.job_id
            );
        } else {
            println!(
                "  {} {} [{}] {}",
                style("✗").red(),
                outcome.job_id,
                outcome.error_kind.as_deref().unwrap_or("unknown"),
                outcome.reason.as_deref().unwrap_or_default()
            );
        }
    }

    println!("  成功: {} 個", style(completed).green());
    if failed > 0 {
        println!("  失敗: {} 個", style(failed).red());
        warn!("合成完成 - 成功: {completed}, 失敗: {failed}");
    } else {
        info!("合成完成 - 成功: {completed}");
    }
}
