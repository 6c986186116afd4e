use std::panic;
use std::process::ExitCode;

use lobby_nickname_ocr::config::PipelineConfig;
use lobby_nickname_ocr::pipeline::{resolve_image_path, NicknamePipeline};
use lobby_nickname_ocr::{NicknameError, NicknameList, NicknameReport};
use sysinfo::System;

const LOG_TARGET_STARTUP: &str = "lobby_nickname_ocr::startup";

/// Initialize tracing on stderr
///
/// stdout carries exactly one JSON object, so every diagnostic goes to
/// stderr. Level comes from RUST_LOG (info by default).
fn initialize_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());

    tracing::debug!(
        target: LOG_TARGET_STARTUP,
        "Starting nickname-ocr v{} on {} ({})",
        version,
        os_name,
        std::env::consts::ARCH
    );
}

fn run(arg: Option<String>) -> Result<NicknameList, NicknameError> {
    // Argument and file checks happen before anything else is set up
    let image_path = resolve_image_path(arg)?;
    tracing::info!("OCR processing started: {}", image_path.display());

    let config = PipelineConfig::load()?;
    let pipeline = NicknamePipeline::from_config(&config);
    pipeline.run(&image_path)
}

fn main() -> ExitCode {
    initialize_tracing();
    log_runtime_environment();

    let arg = std::env::args().nth(1);
    let outcome = panic::catch_unwind(|| run(arg)).unwrap_or_else(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(NicknameError::Internal(detail))
    });
    if let Err(e) = &outcome {
        tracing::error!("{}: {}", e.kind(), e.describe());
    }

    let report = NicknameReport::from_outcome(outcome);
    println!("{}", report.to_json());

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
