//! Shared fixtures for the server's unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::google_auth::ServiceAccountKey;
use axum::{Form, Json, Router, extract::State, routing::post};
use base64::Engine;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// RSA key pair generated for tests only.
pub const PRIVATE_KEY_PEM: &str = include_str!("../testdata/service_account_key.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../testdata/service_account_pub.pem");

pub fn service_account_json(token_uri: &str) -> Value {
    json!({
        "type": "service_account",
        "client_email": "gatepass@aurora.iam.gserviceaccount.com",
        "private_key": PRIVATE_KEY_PEM,
        "token_uri": token_uri,
    })
}

pub fn service_account_base64(token_uri: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(service_account_json(token_uri).to_string())
}

pub fn service_account(token_uri: &str) -> ServiceAccountKey {
    serde_json::from_value(service_account_json(token_uri)).unwrap()
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[derive(Clone, Default)]
struct TokenState {
    hits: Arc<AtomicUsize>,
    last_form: Arc<Mutex<Option<HashMap<String, String>>>>,
    expires_in: u64,
}

/// OAuth token endpoint stub issuing `ya29.minted-N`.
pub struct TokenEndpoint {
    addr: SocketAddr,
    state: TokenState,
}

impl TokenEndpoint {
    pub async fn start(expires_in: u64) -> Self {
        let state = TokenState {
            expires_in,
            ..TokenState::default()
        };
        let router = Router::new()
            .route(
                "/token",
                post(
                    |State(state): State<TokenState>, Form(form): Form<HashMap<String, String>>| async move {
                        let n = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
                        *state.last_form.lock().unwrap() = Some(form);
                        Json(json!({
                            "access_token": format!("ya29.minted-{n}"),
                            "expires_in": state.expires_in,
                            "token_type": "Bearer",
                        }))
                    },
                ),
            )
            .with_state(state.clone());

        Self {
            addr: serve(router).await,
            state,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn last_form(&self) -> Option<HashMap<String, String>> {
        self.state.last_form.lock().unwrap().clone()
    }
}
