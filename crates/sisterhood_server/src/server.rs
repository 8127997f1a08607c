//! Main sync server.

use crate::config::ServerConfig;
use crate::error::{ErrorBody, ServerResult, FALLBACK_MESSAGE};
use crate::handler::{self, AppState};
use crate::rate_limit::{self, RateLimiter};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use sisterhood_core::{Event, Group, Message, SyncCoordinator, SyncStores, User};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// The sync server.
///
/// Owns the process-wide stores (through its coordinator) and exposes them
/// over HTTP.
///
/// # Example
///
/// ```
/// use sisterhood_server::{ServerConfig, SyncServer};
///
/// let server = SyncServer::new(ServerConfig::default());
/// let app = server.router();
///
/// // In a real application, call `server.serve().await` instead.
/// # drop(app);
/// ```
pub struct SyncServer {
    config: ServerConfig,
    state: AppState,
    limiter: Arc<RateLimiter>,
}

impl SyncServer {
    /// Creates a new sync server with empty stores.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_stores(config, Arc::new(SyncStores::new()))
    }

    /// Creates a sync server over existing stores.
    pub fn with_stores(config: ServerConfig, stores: Arc<SyncStores>) -> Self {
        let state = AppState::new(SyncCoordinator::new(stores));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max,
            config.rate_limit_window,
        ));
        Self {
            config,
            state,
            limiter,
        }
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the coordinator behind the HTTP surface.
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.state.coordinator
    }

    /// Builds the HTTP router with all middleware applied.
    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/health", get(handler::health))
            .route(
                "/api/users",
                post(handler::submit::<User>).get(handler::list::<User>),
            )
            .route("/api/users/{id}", get(handler::find::<User>))
            .route(
                "/api/groups",
                post(handler::submit::<Group>).get(handler::list::<Group>),
            )
            .route("/api/groups/{id}", get(handler::find::<Group>))
            .route(
                "/api/events",
                post(handler::submit::<Event>).get(handler::list::<Event>),
            )
            .route("/api/events/{id}", get(handler::find::<Event>))
            .route("/api/messages", post(handler::submit::<Message>))
            .route("/api/messages/{group_id}", get(handler::group_messages))
            .route("/api/sync", post(handler::sync_batch))
            .fallback(handler::not_found)
            .method_not_allowed_fallback(handler::not_found)
            .with_state(self.state.clone());

        let cors = CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

        routes
            .layer(DefaultBodyLimit::max(self.config.body_limit))
            .layer(middleware::from_fn_with_state(
                Arc::clone(&self.limiter),
                rate_limit::enforce,
            ))
            .layer(CompressionLayer::new())
            .layer(cors)
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("SAMEORIGIN"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_DNS_PREFETCH_CONTROL,
                HeaderValue::from_static("off"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::REFERRER_POLICY,
                HeaderValue::from_static("no-referrer"),
            ))
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_response))
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let addr = listener.local_addr()?;
        info!(%addr, "Sisterhood server running");
        info!("Health check: http://{addr}/health");

        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        info!("server stopped");
        Ok(())
    }
}

/// Global fallback for handler panics.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    error!(panic = detail, "handler panicked");

    let body = ErrorBody {
        error: FALLBACK_MESSAGE.into(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_lifecycle() {
        let server = SyncServer::new(ServerConfig::default());
        assert_eq!(server.coordinator().stores().total_count(), 0);
        assert_eq!(server.config().bind_addr.port(), 3000);
    }

    #[test]
    fn shared_stores() {
        let stores = Arc::new(SyncStores::new());
        let server = SyncServer::with_stores(ServerConfig::default(), Arc::clone(&stores));

        server
            .coordinator()
            .apply_batch(serde_json::json!({"users": [{"id": "1"}]}));

        assert_eq!(stores.users.len(), 1);
    }

    #[test]
    fn panic_fallback_is_generic() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
