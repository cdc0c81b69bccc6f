use zapimg_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration (.env supported in development)
    let config = Config::from_env()?;

    zapimg_api::telemetry::init_tracing();

    // Initialize the application (storage, payments, sessions, routes)
    let (_state, router) = zapimg_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    zapimg_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
