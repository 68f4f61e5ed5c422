use obligation_grid::app;
use obligation_grid::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage: grid-server [port]
    let config = AppConfig::from_env_and_args();

    app::run(config).await?;

    Ok(())
}
