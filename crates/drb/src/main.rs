use std::{process::ExitCode, sync::Arc};

use drb_core::{completion::RelayCore, config::Config};
use drb_openai::OpenAiClient;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), drb_core::Error> {
    drb_core::logging::init("drb")?;

    let cfg = Arc::new(Config::load()?);

    let transport = Arc::new(OpenAiClient::from_config(&cfg)?);
    tracing::info!(
        endpoint = transport.endpoint(),
        timeout_secs = cfg.request_timeout.as_secs(),
        max_input_chars = cfg.max_input_chars,
        "completion client ready"
    );
    let relay = RelayCore::new(transport);

    drb_telegram::router::run_polling(cfg, relay)
        .await
        .map_err(|e| drb_core::Error::External(format!("telegram bot failed: {e:#}")))?;

    Ok(())
}
