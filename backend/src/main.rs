//! Smart Irrigation relay - server binary

use smart_irrigation_backend::{bind_listener, build_state, create_app, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "irrigation_server=debug,smart_irrigation_backend=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Smart Irrigation relay");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!(
        "Weather location: {}, valve controller: {}",
        config.weather.location,
        config.actuator.base_url
    );

    let host = config.server.host.clone();
    let port = config.server.port;

    // Create application state
    let state = build_state(config)?;
    tracing::info!("Classifier backend: {}", state.predictor.classifier_name());

    // Build application
    let app = create_app(state);

    // Start server
    let listener = bind_listener(&host, port).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
