//! Custom Axum extractors.
//!
//! - `ClientIp`: client address for per-client rate limiting
//! - `ProxyHeaders`: whether forwarding headers are trusted for `ClientIp`
//! - `RequestId`: id assigned by [`crate::middleware::request_id_layer`]
//!
//! # Examples
//!
//! ```ignore
//! use gatepass_web::extractors::{ClientIp, RequestId};
//!
//! async fn handler(client_ip: ClientIp, request_id: RequestId) -> String {
//!     format!("{} from {}", request_id.0, client_ip.0)
//! }
//! ```

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Whether `X-Forwarded-For` / `X-Real-IP` may name the client.
///
/// Installed as a request extension by the router. Absent means untrusted:
/// any client can set these headers, so only a deployment behind a proxy
/// that overwrites them should enable it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProxyHeaders {
    /// Honor forwarding headers.
    pub trusted: bool,
}

/// Client IP address.
///
/// # Priority
///
/// 1. `X-Forwarded-For` (first IP in the list), only with trusted [`ProxyHeaders`]
/// 2. `X-Real-IP`, only with trusted [`ProxyHeaders`]
/// 3. Connection IP (when the server is run with `ConnectInfo`)
/// 4. `127.0.0.1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let connect_info = parts.extensions.get::<ConnectInfo<SocketAddr>>();
        let proxy = parts.extensions.get::<ProxyHeaders>().copied().unwrap_or_default();
        Ok(Self(extract_client_ip(&parts.headers, connect_info, proxy)))
    }
}

/// Extract client IP from headers or connection info.
fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    proxy: ProxyHeaders,
) -> IpAddr {
    let peer = connect_info.map_or(IpAddr::V4(Ipv4Addr::LOCALHOST), |ConnectInfo(addr)| addr.ip());
    if !proxy.trusted {
        return peer;
    }

    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return ip;
    }

    let real_ip = headers
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return ip;
    }

    peer
}

/// Request id assigned by the request id middleware.
///
/// Empty when the middleware is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self(String::new())))
    }
}
