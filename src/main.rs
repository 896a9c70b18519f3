use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use medibook::api::{api_router, AppState};
use medibook::booking::BookingService;
use medibook::config::{self, AppConfig};
use medibook::payment::gateway::HttpGateway;
use medibook::pricing::PriceTable;
use medibook::sweep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cfg = AppConfig::from_env()?;
    tracing::info!(
        app = config::APP_NAME,
        version = config::APP_VERSION,
        db = %cfg.db_path.display(),
        "Starting"
    );

    // Opening the database once at startup runs pending migrations, so a
    // schema problem fails the process here instead of on first request.
    medibook::db::open_database(&cfg.db_path)?;

    let prices = match &cfg.price_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading price table");
            PriceTable::from_json_file(path)?
        }
        None => PriceTable::builtin(),
    };

    let gateway = HttpGateway::new(
        &cfg.gateway_base_url,
        &cfg.processor_account_key,
        &cfg.processor_api_secret,
        30,
    );

    let booking = BookingService::new(
        Arc::new(prices),
        Arc::new(gateway),
        cfg.signature_secret.clone(),
        cfg.currency.clone(),
    );

    let state = Arc::new(AppState::new(
        cfg.db_path.clone(),
        booking,
        cfg.processor_account_key.clone(),
    ));

    {
        let mut sessions = state.sessions.write().unwrap();
        for (token, caller_id) in &cfg.session_tokens {
            sessions.register(token, caller_id);
        }
        tracing::info!(count = cfg.session_tokens.len(), "Registered sessions");
    }

    let _sweeper = sweep::start_sweeper(cfg.db_path.clone(), cfg.pending_ttl_mins);

    let app = api_router(state);
    let listener = tokio::net::TcpListener::bind(cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    tracing::info!("Stopped");
    Ok(())
}
