use finance_query_gateway::{
    api::{start_server, ApiState},
    config::{Config, GEMINI_MODEL},
    dispatcher::Dispatcher,
    gemini::GeminiClient,
    portfolio::PortfolioAdvisor,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables (before tracing so RUST_LOG in .env applies)
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        error!("Set GEMINI_API_KEY in the environment or a .env file");
        e
    })?;

    info!("🚀 Finance Query Gateway - API Server");
    info!("📍 Address: {}", config.bind_addr());
    info!("🤖 Model: {}", GEMINI_MODEL);
    info!("🔎 Classifier: {:?}", config.classifier);

    // Create components
    let gemini = Arc::new(GeminiClient::from_config(&config)?);
    let advisor = Arc::new(PortfolioAdvisor::new(gemini.clone(), config.portfolio_fallback));
    let dispatcher = Arc::new(Dispatcher::new(
        config.classifier.build(),
        gemini,
        advisor.clone(),
    ));

    info!("✅ Dispatcher initialized");

    // Start API server
    start_server(ApiState { dispatcher, advisor }, &config.bind_addr()).await?;

    Ok(())
}
