use siftledger_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load()?;
    siftledger_observability::init_with(&settings.logging);

    tracing::info!(environment = %settings.environment, "starting siftledger api");

    let app = siftledger_api::app::build_app(&settings)?;

    let listener = tokio::net::TcpListener::bind(settings.bind_address()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
