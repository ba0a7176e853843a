use crate::config::Config;
use crate::http_server::middleware::{
    access_log_middleware, permissive_cors, rate_limit_middleware, require_authenticated,
    response_time_middleware, security_headers_middleware, session_middleware, RateLimiter,
    SecurityHeadersConfig, SessionLayerState,
};
use crate::http_server::routes;
use crate::session::SessionStore;
use crate::store::ListingStore;
use crate::utils::shutdown::ShutdownCoordinator;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tracing::{debug, info, warn};

/// Shared state handed to handlers and middleware
pub struct AppState {
    pub listings: Arc<dyn ListingStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub limiter: Arc<RateLimiter>,
    pub session: Arc<SessionLayerState>,
    pub security: Arc<SecurityHeadersConfig>,
}

impl AppState {
    pub fn new(
        config: &Config,
        listings: Arc<dyn ListingStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            listings,
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            session: Arc::new(SessionLayerState::new(&config.session, sessions.clone())),
            sessions,
            security: Arc::new(SecurityHeadersConfig::default()),
        }
    }
}

/// Build the application router.
///
/// Every request passes, outermost first, through security headers, response
/// timing, the access log, CORS, the rate limiter and the session layer.
/// `/logout` additionally requires an authenticated session.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/logout", get(routes::logout))
        .route_layer(from_fn(require_authenticated));

    Router::new()
        .route("/health", get(routes::health))
        .route("/login", get(routes::login))
        .route("/api/pricemax", get(routes::price_max))
        .route("/api/pricerange", get(routes::price_range))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(
                    state.security.clone(),
                    security_headers_middleware,
                ))
                .layer(from_fn(response_time_middleware))
                .layer(from_fn(access_log_middleware))
                .layer(permissive_cors())
                .layer(from_fn_with_state(
                    state.limiter.clone(),
                    rate_limit_middleware,
                ))
                .layer(from_fn_with_state(state.session.clone(), session_middleware)),
        )
        .with_state(state)
}

pub struct HttpServer {
    config: Config,
    state: Arc<AppState>,
    shutdown: ShutdownCoordinator,
}

impl HttpServer {
    pub fn new(config: Config, state: Arc<AppState>, shutdown: ShutdownCoordinator) -> Self {
        Self {
            config,
            state,
            shutdown,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener =
            TcpListener::bind((self.config.server.host.as_str(), self.config.server.port)).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown is triggered
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        let app = self.router();
        info!("Starting HTTP server on {}", listener.local_addr()?);

        let maintenance = self.spawn_maintenance();

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(self.shutdown.wait())
        .await?;

        self.shutdown.shutdown();
        if let Err(e) = maintenance.await {
            warn!("Maintenance task ended abnormally: {}", e);
        }

        info!("HTTP server stopped");
        Ok(())
    }

    /// Periodically drop elapsed rate-limit windows and expired sessions
    fn spawn_maintenance(&self) -> JoinHandle<()> {
        let limiter = self.state.limiter.clone();
        let sessions = self.state.sessions.clone();
        let period = Duration::from_secs(self.config.rate_limit.cleanup_interval_secs.max(1));
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let windows = limiter.purge_expired();
                        match sessions.purge_expired().await {
                            Ok(expired) => {
                                debug!(windows, sessions = expired, "Purged expired entries")
                            }
                            Err(e) => warn!("Failed to purge expired sessions: {}", e),
                        }
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::MemorySessionStore;
    use crate::store::MemoryListingStore;

    fn test_config() -> Config {
        Config {
            session: SessionConfig {
                secret: "keyboard cat".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn test_state(config: &Config) -> Arc<AppState> {
        Arc::new(AppState::new(
            config,
            Arc::new(MemoryListingStore::default()),
            Arc::new(MemorySessionStore::new()),
        ))
    }

    #[test]
    fn test_app_state_follows_config() {
        let mut config = test_config();
        config.session.cookie_name = "sid".to_string();
        let state = test_state(&config);

        assert_eq!(state.session.cookie.name, "sid");
        assert_eq!(state.limiter.tracked_clients(), 0);
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let config = test_config();
        let state = test_state(&config);
        let shutdown = ShutdownCoordinator::new();
        let server = HttpServer::new(config, state, shutdown.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let handle = tokio::spawn(server.serve(listener));

        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                shutdown.shutdown();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("server did not stop");

        assert!(handle.await.unwrap().is_ok());
    }
}
