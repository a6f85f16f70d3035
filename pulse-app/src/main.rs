use anyhow::{Context, Result};
use pulse_common::observability::init_logging;
use pulse_config::{PulseConfig, PulseConfigLoader};

const CONFIG_FILE: &str = "pulse.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1) Load config (env wins over the optional file)
    let cfg: PulseConfig = PulseConfigLoader::new()
        .with_optional_file(CONFIG_FILE)
        .load()
        .context("loading configuration")?;

    let log_path = init_logging(cfg.log.to_log_config())?;
    tracing::info!(
        log_file = %log_path.display(),
        community_id = %cfg.community_id,
        window_days = cfg.window_days,
        page_size = cfg.page_size,
        "pulse.start"
    );

    pulse_core::run(&cfg).await.inspect_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "pulse.failed");
    })?;
    Ok(())
}
