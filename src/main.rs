use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use reelgate::auth::OsPinSource;
use reelgate::clock::SystemClock;
use reelgate::config::Config;
use reelgate::email::{LogOnlyDelivery, PinDelivery, SystemMailer};
use reelgate::state::{AppState, Collaborators};
use reelgate::store::{MemoryStore, PgStore, ResetStore, UserStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting Reelgate");

    let (users, resets) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Migrations applied");

            let store = Arc::new(PgStore::new(pool));
            let users: Arc<dyn UserStore> = store.clone();
            let resets: Arc<dyn ResetStore> = store;
            (users, resets)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            let users: Arc<dyn UserStore> = store.clone();
            let resets: Arc<dyn ResetStore> = store;
            (users, resets)
        }
    };

    let delivery: Arc<dyn PinDelivery> = match config.smtp.as_ref().map(SystemMailer::new) {
        Some(Ok(mailer)) => {
            tracing::info!("System SMTP configured");
            Arc::new(mailer)
        }
        Some(Err(e)) => {
            tracing::warn!("System SMTP not available: {e}");
            Arc::new(LogOnlyDelivery)
        }
        None => Arc::new(LogOnlyDelivery),
    };

    let addr = SocketAddr::new(config.host, config.port);
    let reap_interval = config.reset_reap_interval_secs;

    let state = AppState::new(
        config,
        Collaborators {
            users,
            resets,
            delivery,
            pin_source: Arc::new(OsPinSource),
            clock: Arc::new(SystemClock),
        },
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = (reap_interval > 0).then(|| {
        reelgate::reaper::spawn(
            state.clone(),
            Duration::from_secs(reap_interval),
            shutdown_rx,
        )
    });

    let app = reelgate::build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = reaper {
        let _ = handle.await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
