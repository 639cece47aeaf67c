use std::process::ExitCode;

use configs::AppConfig;
use tracing::{error, info};
use uuid::Uuid;

const SERVICE: &str = "claims";

fn init_logging() {
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => common::utils::logging::init_logging_json(),
        _ => common::utils::logging::init_logging_default(),
    }
}

fn install_panic_hook(instance: Uuid) {
    std::panic::set_hook(Box::new(move |panic| {
        error!(service = SERVICE, event = "panic", %instance, message = %panic, "claims service panicked");
    }));
}

fn build_runtime(cfg: &AppConfig) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all().thread_name("claims-worker");
    if let Some(threads) = cfg.server.worker_threads {
        builder.worker_threads(threads);
    }
    builder.build()
}

fn main() -> ExitCode {
    // .env must be in place before RUST_LOG / LOG_FORMAT and config overrides are read
    dotenvy::dotenv().ok();
    init_logging();

    let instance = Uuid::new_v4();
    install_panic_hook(instance);

    let cfg = match server::startup::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = SERVICE, event = "config_invalid", error = %e, "refusing to start");
            return ExitCode::FAILURE;
        }
    };

    let rt = match build_runtime(&cfg) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = SERVICE, event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = SERVICE,
        event = "start",
        %instance,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        data_dir = %cfg.storage.data_dir,
        "claims service starting"
    );

    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(service = SERVICE, event = "stop", %instance, "claims service stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = SERVICE, event = "run_failed", %instance, error = %e, "claims service exited with error");
            ExitCode::FAILURE
        }
    }
}
