use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hearth_api::config::ServerConfig;
use hearth_api::router::build_app_router;
use hearth_api::state::AppState;
use hearth_core::localization::Translations;
use hearth_events::{EventBus, PushDelivery, PushWorker, ReminderConfig, ReminderScheduler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "hearth_api=debug,hearth_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = hearth_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    hearth_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    hearth_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready, migrations applied");

    // --- Translations ---
    let translations = Translations::load_dir(&config.locales_dir, config.default_locale.clone())
        .expect("Failed to load translation catalogs");
    tracing::info!(languages = ?translations.languages(), "Translations loaded");

    // --- Event bus and background services ---
    let event_bus = Arc::new(EventBus::default());

    let push_handle = match &config.push_gateway_url {
        Some(url) => {
            let delivery = PushDelivery::new(url).expect("Invalid PUSH_GATEWAY_URL");
            let worker = PushWorker::new(Arc::new(delivery)).with_pool(pool.clone());
            tracing::info!(gateway = %url, "Push worker started");
            Some(tokio::spawn(worker.run(event_bus.subscribe())))
        }
        None => {
            tracing::warn!("PUSH_GATEWAY_URL is empty, push delivery disabled");
            None
        }
    };

    let reminder_cancel = CancellationToken::new();
    let reminder_scheduler = ReminderScheduler::new(
        pool.clone(),
        Arc::clone(&event_bus),
        ReminderConfig {
            interval: Duration::from_secs(config.reminder_interval_secs),
            window: chrono::Duration::minutes(config.reminder_window_mins),
            ..Default::default()
        },
    );
    let reminder_token = reminder_cancel.clone();
    let reminder_handle = tokio::spawn(async move {
        reminder_scheduler.run(reminder_token).await;
    });

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        translations: Arc::new(translations),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    reminder_cancel.cancel();
    let _ = tokio::time::timeout(grace, reminder_handle).await;
    tracing::info!("Reminder scheduler stopped");

    // Dropping the last sender closes the channel; the worker drains and exits.
    // The router (and its state clone) is gone once `serve` returns.
    drop(event_bus);
    if let Some(handle) = push_handle {
        let _ = tokio::time::timeout(grace, handle).await;
        tracing::info!("Push worker stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
