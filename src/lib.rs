#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::adapters::database::push_token_repo::TokenStore;
use crate::adapters::push::PushProvider;
use crate::api::ServiceContainer;
use crate::config::Config;
use crate::services::dispatch_service::DispatchService;
use crate::services::health_service::HealthService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wires the injected collaborators into the application services.
#[derive(Debug)]
pub struct AppBuilder {
    config: Config,
    token_store: Option<Arc<dyn TokenStore>>,
    push_provider: Option<Arc<dyn PushProvider>>,
}

impl AppBuilder {
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config, token_store: None, push_provider: None }
    }

    #[must_use]
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    #[must_use]
    pub fn with_push_provider(mut self, provider: Arc<dyn PushProvider>) -> Self {
        self.push_provider = Some(provider);
        self
    }

    /// Builds the service container.
    ///
    /// # Errors
    /// Returns an error if a required collaborator was not supplied.
    pub fn build(self) -> anyhow::Result<ServiceContainer> {
        let store = self.token_store.ok_or_else(|| anyhow::anyhow!("Token store is required"))?;
        let provider = self.push_provider.ok_or_else(|| anyhow::anyhow!("Push provider is required"))?;

        let dispatch_service =
            DispatchService::new(Arc::clone(&store), provider, self.config.dispatch.max_batch_size as usize)
                .with_deadline(Duration::from_secs(self.config.server.request_timeout_secs));
        let health_service = HealthService::new(store, self.config.health.clone());

        Ok(ServiceContainer { dispatch_service, health_service })
    }
}

/// Routes panics through tracing so they reach the configured log sink.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map(|l| format!("{}:{}", l.file(), l.line())).unwrap_or_default();
        tracing::error!(panic = %info, location = %location, "Process panicked");
    }));
}

/// Flips `shutdown_tx` to `true` on Ctrl+C or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
