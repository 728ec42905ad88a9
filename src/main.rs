use dead_pigeons::orchestration::RoundScheduler;
use dead_pigeons::{api, config::Config, db::init_db, Clock, Repository, SystemClock};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // The scheduler's first cycle closes anything whose deadline passed while we were down.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = RoundScheduler::new(
        repo.clone(),
        clock.clone(),
        config.schedule(),
        config.scheduler_retry,
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx));

    let app = api::create_router(api::AppState::new(repo, config, clock));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        tracing::info!("Shutdown signal received");
    });

    if let Err(e) = server.await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }

    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler_handle.await {
        tracing::error!(error = %e, "Round scheduler task failed");
    }
    tracing::info!("Shutdown complete");
}
