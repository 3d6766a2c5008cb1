use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use dispatch_api::auth::service::AuthService;
use dispatch_api::auth::AuthConfig;
use dispatch_api::{create_app, AppState};
use dispatch_domain::DispatchService;
use dispatch_infrastructure::DatabaseManager;

use crate::config::AppConfig;

/// Wires the database, services and HTTP server together.
pub struct Application {
    config: AppConfig,
    state: AppState,
    db: DatabaseManager,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = DatabaseManager::connect(
            &config.database.url,
            config.database.max_connections,
            Duration::from_secs(config.database.connection_timeout_seconds),
        )
        .await
        .context("failed to connect to the database")?;

        db.migrate()
            .await
            .context("failed to run database migrations")?;
        db.health_check()
            .await
            .context("database health check failed")?;

        let auth_config = AuthConfig {
            jwt_secret: config.auth.jwt_secret.clone(),
            access_token_expire_minutes: config.auth.access_token_expire_minutes,
        };
        let state = AppState {
            dispatch_service: Arc::new(DispatchService::new(db.dispatch_repository())),
            auth_service: Arc::new(AuthService::new(&auth_config, db.user_repository())),
        };

        Ok(Self { config, state, db })
    }

    pub async fn run(self) -> Result<()> {
        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&self.config.api.bind_address)
            .await
            .with_context(|| format!("failed to bind {}", self.config.api.bind_address))?;
        info!(address = %self.config.api.bind_address, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("server error")?;

        self.db.close().await;
        info!("dispatchd stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install ctrl-c handler: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => tracing::error!("failed to install SIGTERM handler: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
