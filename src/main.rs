use mc_option_pricer::config::AppConfig;
use mc_option_pricer::server;
use mc_option_pricer::state::AppState;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("mc_option_pricer starting");

    // Load config
    let cfg = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    match cfg.pricer_seed {
        Some(seed) => {
            tracing::info!(seed = seed, "monte carlo engine seeded, results are reproducible")
        }
        None => tracing::info!("monte carlo engine seeded from OS entropy per request"),
    }

    let port = cfg.server_port;
    tracing::info!(
        static_dir = %cfg.static_dir.display(),
        max_simulations = cfg.max_simulations,
        "configuration loaded"
    );

    let app = server::router(AppState::new(cfg));

    let addr = format!("0.0.0.0:{port}");
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
