use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=warn,reqwest=warn";

/// Инициализация системы трассировки (tracing)
///
/// Логи пишутся в:
/// - stdout (с цветами)
/// - logs/dispatcher.log рядом с exe (без цветов)
pub fn initialize() -> anyhow::Result<()> {
    println!("========================================");
    println!("  LOGGING SYSTEM INITIALIZATION");
    println!("========================================\n");

    let log_dir = log_directory();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        println!("✗ ERROR: Cannot create log directory: {}", e);
        println!("  Path: {}", log_dir.display());
        println!("========================================\n");
        return Err(anyhow::anyhow!("Cannot create log directory: {}", e));
    }

    let log_file_path = log_dir.join("dispatcher.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            println!("✗ ERROR: Cannot open log file {}: {}", log_file_path.display(), e);
            anyhow::anyhow!("Cannot open log file: {}", e)
        })?;
    println!("✓ Log file: {}", log_file_path.display());

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    println!("✓ Log level: {}", log_level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Arc::new(log_file))
                .with_ansi(false),
        )
        .init();

    println!("✓ Tracing subscriber initialized");
    println!("========================================\n");

    Ok(())
}

/// `logs/` next to the executable, `target/logs` otherwise
fn log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("logs")))
        .unwrap_or_else(|| PathBuf::from("target").join("logs"))
}
