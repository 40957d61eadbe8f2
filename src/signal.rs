use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 安裝 Ctrl-C 處理器，回傳共用的中斷旗標
///
/// 合成流程在每次呼叫外部程序前檢查此旗標
pub fn setup_shutdown_signal() -> anyhow::Result<Arc<AtomicBool>> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\n收到中斷信號，目前的外部程序結束後停止...");
    })
    .map_err(|e| anyhow::anyhow!("無法設定 Ctrl-C 處理器: {e}"))?;

    Ok(shutdown_signal)
}

/// 建立不會被觸發的旗標（測試與函式庫呼叫端使用）
#[must_use]
pub fn never_cancelled() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[must_use]
pub fn is_cancelled(signal: &AtomicBool) -> bool {
    signal.load(Ordering::SeqCst)
}
