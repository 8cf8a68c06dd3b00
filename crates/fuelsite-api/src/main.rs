use fuelsite_api::setup;
use fuelsite_core::UploadServerConfig;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    setup::init_tracing();

    let config = UploadServerConfig::from_env()?;
    let (_state, router) = setup::initialize_app(&config).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
