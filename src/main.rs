use attendance_buddy::{
    config::{
        self,
        database::{create_connection, create_tables, seed_default_admin},
    },
    core::session::purge_expired_sessions,
    errors::Result,
    web::{AppState, create_router},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load .env so RUST_LOG and the overrides below can come from it
    dotenv().ok();

    // 2. Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = create_connection(&app_config.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed the admin account on first start
    if seed_default_admin(&db, &app_config.auth.default_admin_password).await? {
        warn!("Created the admin account with the configured default password; change it after logging in");
    }

    match purge_expired_sessions(&db).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "Purged expired sessions"),
        Err(e) => error!(error = %e, "Failed to purge expired sessions"),
    }

    // 6. Serve
    let bind_address = app_config.server.bind_address.clone();
    let state = AppState {
        db,
        config: Arc::new(app_config),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
