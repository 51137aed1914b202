//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, gate,
//!   security headers)
//! - Bind server to listener with graceful shutdown
//! - Run the session sweeper and apply config reloads

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{AccessGate, MemoryCredentialStore, MemorySessionStore, SessionStore, SessionSweeper};
use crate::config::GateConfig;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::security::{access_gate_middleware, with_security_headers};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
}

/// HTTP server for the session gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    gate: Arc<AccessGate>,
    credentials: Arc<MemoryCredentialStore>,
}

impl HttpServer {
    /// Create a new HTTP server with in-memory credential and session stores.
    pub fn new(config: GateConfig) -> Self {
        Self::with_session_store(config, Arc::new(MemorySessionStore::new()))
    }

    /// Create a server around an externally owned session store.
    pub fn with_session_store(config: GateConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let credentials = Arc::new(MemoryCredentialStore::new(&config.users));
        let gate = Arc::new(AccessGate::new(
            credentials.clone(),
            sessions,
            config.session.clone(),
        ));

        let state = AppState { gate: gate.clone() };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            gate,
            credentials,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(handlers::greeting))
            .route("/login", get(handlers::login_page).post(handlers::login_submit))
            .route("/logout", post(handlers::logout).get(handlers::logout))
            .fallback(handlers::not_found)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                access_gate_middleware,
            ))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::REQUEST_TIMEOUT,
                        Duration::from_secs(config.timeouts.request_secs),
                    )),
            );

        // Outermost, so rejections from the limit and timeout layers carry them too
        if config.security.enable_headers {
            with_security_headers(router)
        } else {
            router
        }
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn gate(&self) -> Arc<AccessGate> {
        self.gate.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` are applied live; the server
    /// drains in-flight requests and returns once `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            users = self.credentials.len(),
            "HTTP server starting"
        );
        if self.credentials.is_empty() {
            tracing::warn!("Credential store is empty, every login will be rejected");
        }

        let sweeper = SessionSweeper::new(self.gate.clone());
        let sweeper_task = tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let reloader = ConfigReloader {
            gate: self.gate.clone(),
            credentials: self.credentials.clone(),
            current: self.config.clone(),
        };
        let reload_task = tokio::spawn(reloader.run(config_updates, shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        let _ = sweeper_task.await;
        let _ = reload_task.await;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Applies reloaded configuration to the running gate.
struct ConfigReloader {
    gate: Arc<AccessGate>,
    credentials: Arc<MemoryCredentialStore>,
    current: GateConfig,
}

impl ConfigReloader {
    async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                update = updates.recv() => match update {
                    Some(config) => self.apply(config),
                    // No watcher; nothing more will arrive
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    }

    fn apply(&mut self, config: GateConfig) {
        if config.users.is_empty() {
            tracing::warn!("Reloaded config has no users, keeping current credentials");
        } else if config.users != self.current.users {
            self.credentials.replace(&config.users);
        }

        let mut session = config.session.clone();
        if session.cookie_name != self.current.session.cookie_name {
            // Live sessions are bound to the cookie name they were issued under
            tracing::warn!(
                cookie_name = %session.cookie_name,
                "Session cookie name change takes effect after restart"
            );
            session.cookie_name = self.current.session.cookie_name.clone();
        }
        if session != self.current.session {
            self.gate.update_policy(session.clone());
        }

        if config.listener.bind_address != self.current.listener.bind_address
            || config.timeouts.request_secs != self.current.timeouts.request_secs
            || config.security.max_body_size != self.current.security.max_body_size
            || config.security.enable_headers != self.current.security.enable_headers
        {
            tracing::warn!("Listener, timeout and security changes take effect after restart");
        }

        let users = if config.users.is_empty() {
            std::mem::take(&mut self.current.users)
        } else {
            config.users.clone()
        };
        self.current = GateConfig {
            users,
            session,
            ..config
        };
    }
}
