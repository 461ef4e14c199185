use detection_api::{config, logging::setup_logging, start_app};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let environment = config::Environment::from_env()?;
    let config = config::get_configuration(environment)?;

    setup_logging(config.log_level, environment);
    tracing::debug!(?config, "configuration loaded");

    start_app(config).await?;

    Ok(())
}
