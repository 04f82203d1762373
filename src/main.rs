use std::process::ExitCode;
use tracing::error;
use work_order_tracker::{config::Config, init_logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = run(config).await {
        error!("Server stopped: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
