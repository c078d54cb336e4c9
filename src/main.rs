use ppx_bridge::handlers::create_app_router;
use ppx_bridge::init::app_init;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenv::dotenv().ok();
    log::info!("🚀 Starting Perplexity bridge...");
    let (config, state) = app_init().await?;
    log::info!("✅ Application state initialized");
    let app = create_app_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("");
    log::info!("🎉 Server started!");
    log::info!("📍 http://{}", addr);
    log::info!("❓ Ask: http://{}/api/ask", addr);
    log::info!("🧰 Tools: http://{}/api/tools", addr);
    log::info!("❤️  Health: http://{}/health", addr);
    log::info!("🔌 Upstream: {}", config.base_url);
    log::info!("🍪 Settings: {}", config.settings_path.display());
    log::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
