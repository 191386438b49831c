//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, CORS, timeouts, body limit, panics)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use axum::{
    extract::{DefaultBodyLimit, FromRef, Request, State},
    http::{header, HeaderName, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::forms;
use crate::http::request::ClientIpPolicy;
use crate::http::response::ApiError;
use crate::notifications::Mailer;
use crate::security::csrf::{csrf_middleware, CsrfState, CSRF_HEADER};
use crate::security::rate_limit::{Clock, SystemClock};
use crate::storage::Store;
use crate::submissions::SubmissionService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubmissionService>,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for ClientIpPolicy {
    fn from_ref(state: &AppState) -> Self {
        ClientIpPolicy {
            trust_forwarded_for: state.config.security.trust_forwarded_for,
        }
    }
}

/// HTTP server for the forms API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server on the system clock.
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>) -> Self {
        Self::with_clock(config, store, mailer, Arc::new(SystemClock))
    }

    /// Create a new HTTP server with an explicit clock.
    pub fn with_clock(
        config: AppConfig,
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let service = Arc::new(SubmissionService::new(
            store,
            mailer,
            clock,
            config.rate_limits.clone(),
            config.notifications.clone(),
        ));

        let state = AppState {
            service,
            config: config.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let csrf = CsrfState {
            enabled: config.security.csrf_enabled,
        };
        let deadline = Duration::from_secs(config.timeouts.request_secs);

        Router::new()
            .route("/api/forms", any(forms::submit_form))
            .route_layer(middleware::from_fn_with_state(csrf, csrf_middleware))
            .route("/health", get(forms::health))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(cors_layer())
            .layer(middleware::from_fn_with_state(deadline, request_timeout))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            storage = self.config.storage.driver.as_str(),
            csrf_enabled = self.config.security.csrf_enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
}

/// Bound the whole request. An expired request gets the generic JSON 500
/// rather than an empty 408.
async fn request_timeout(State(deadline): State<Duration>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::error!(path = %path, timeout_secs = deadline.as_secs(), "Request timed out");
            ApiError::SERVER_ERROR.into_response()
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::SERVER_ERROR.into_response()
}
