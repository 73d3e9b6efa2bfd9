use mytone_core::error::AppError;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AuthStrategy, WebConfig};
use crate::services::{storage, CredentialVerifier, Database, SessionIssuer, UpstreamClient};
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    pub async fn build(config: WebConfig) -> Result<Self, AppError> {
        let db = Database::connect(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        db.run_migrations().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            e
        })?;

        let db = Arc::new(db);
        let upstream = UpstreamClient::new(config.upstream.base_url.clone());

        let verifier = match config.auth.strategy {
            AuthStrategy::LocalStore => CredentialVerifier::LocalStore(db.clone()),
            AuthStrategy::DelegatedApi => CredentialVerifier::DelegatedApi(upstream.clone()),
        };

        let storage = storage::from_config(&config.storage, &config.session.secret).await?;

        let state = AppState {
            sessions: SessionIssuer::from_config(&config.session),
            verifier,
            identities: db.clone(),
            news: db,
            storage,
            upstream,
            config,
        };

        let address = state.config.server.address();
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            address = %address,
            strategy = state.config.auth.strategy.as_str(),
            "Listener bound"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(port = self.port, "mytone-web listening");
        axum::serve(self.listener, build_router(self.state)).await
    }
}
