//! Axum HTTP layer for gatepass.
//!
//! Thin shell around the services in `gatepass-core`: request parsing, error
//! mapping, per-client rate limiting on registration, CORS, security headers,
//! request ids, tracing and metrics.
//!
//! # Routes
//!
//! - `POST /api/register` - register and receive the signed credential
//! - `POST /api/verify-entry` - scan a credential at the gate
//! - `POST /api/uploadPdf` - store the rendered pass document
//! - `GET /health` - liveness
//!
//! # Example
//!
//! ```ignore
//! use gatepass_web::{AppState, RouterConfig, build_router};
//!
//! let app = build_router(state, &RouterConfig::default());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod rate_limit;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ClientIp, ProxyHeaders, RequestId};
pub use middleware::{REQUEST_ID_HEADER, cors_layer, request_id_layer, with_security_headers};
pub use rate_limit::{InMemoryRateLimiter, RateLimitPolicy};
pub use state::AppState;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use gatepass_core::constants::MAX_PASS_DOCUMENT_BYTES;
use gatepass_core::providers::{AssetStore, RateLimiter, RegistrantRepository};
use tower_http::trace::TraceLayer;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;

/// Slack on top of the PDF size for the other multipart parts and boundaries.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Front-end origins allowed by default.
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "https://aurora25-passgen.vercel.app",
    "http://localhost:3000",
    "https://aurora25-qrscan.vercel.app",
];

/// Router settings that are not part of the application state.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Enable only behind a proxy that overwrites those headers.
    pub trust_proxy_headers: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
            trust_proxy_headers: false,
        }
    }
}

/// Build the complete Axum router.
///
/// # Layers (outermost first)
///
/// 1. Request id
/// 2. HTTP tracing
/// 3. Security headers
/// 4. CORS
/// 5. Proxy header trust for [`ClientIp`]
#[must_use]
pub fn build_router<R, S, L>(state: AppState<R, S, L>, config: &RouterConfig) -> Router
where
    R: RegistrantRepository + 'static,
    S: AssetStore + 'static,
    L: RateLimiter + 'static,
{
    let api_routes = Router::new()
        .route("/register", post(handlers::register::<R, S, L>))
        .route("/verify-entry", post(handlers::verify_entry::<R, S, L>))
        .route(
            "/uploadPdf",
            post(handlers::upload_pdf::<R, S, L>)
                .layer(DefaultBodyLimit::max(MAX_PASS_DOCUMENT_BYTES + MULTIPART_OVERHEAD_BYTES)),
        );

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(Extension(ProxyHeaders {
            trusted: config.trust_proxy_headers,
        }))
        .layer(cors_layer(&config.cors_origins));

    with_security_headers(router)
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
