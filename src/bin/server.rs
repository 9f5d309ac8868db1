use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use stargazer::config::{get_config, CliArgs};
use stargazer::notify::{HttpNotifier, NoopNotifier, Notifier};
use stargazer::payments::{HttpPaymentProvider, PaymentProvider, SandboxProvider};
use stargazer::state::AppState;
use stargazer::{create_app, db, repo, run_migrations};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes logging to the console and a daily-rotated file
///
/// Returns the appender guard, which must stay alive for the file
/// writer to flush.
fn init_tracing(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "stargazer.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stargazer={}", default_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;
    let _guard = init_tracing(debug);

    let config = get_config(args);

    // Initialize the database pool and bring the schema up to date
    let pool = Arc::new(db::init_pool(&config.database_url));
    {
        let mut conn = pool.get()?;
        run_migrations(&mut conn);
    }

    // A real payment processor when one is configured, the sandbox otherwise
    let payments: Arc<dyn PaymentProvider> = match (
        config.payment_provider_url.clone(),
        config.payment_provider_secret.clone(),
    ) {
        (Some(url), Some(secret)) => {
            info!("Using payment processor at {}", url);
            Arc::new(HttpPaymentProvider::new(url, secret))
        }
        _ => {
            warn!("No payment processor configured; checkouts go to the sandbox");
            Arc::new(SandboxProvider::new(config.public_base_url.clone()))
        }
    };

    let notifier: Arc<dyn Notifier> = match config.notify_url.clone() {
        Some(url) => {
            info!("Sending notifications to {}", url);
            Arc::new(HttpNotifier::new(url))
        }
        None => {
            warn!("No mail bridge configured; notifications are dropped");
            Arc::new(NoopNotifier)
        }
    };

    let state = AppState::new(pool.clone(), config.clone(), payments, notifier);

    // Expired sessions are swept in the background for the life of the server
    let sweep_interval = config.session_sweep_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            match repo::sweep_expired_sessions(&pool).await {
                Ok(swept) if swept > 0 => info!("Swept {} expired sessions", swept),
                Ok(_) => {}
                Err(err) => warn!("Session sweep failed: {}", err),
            }
        }
    });

    // The browser front end is served from elsewhere
    let app = create_app(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
