#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
mod handler;
mod structures;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::Request,
    http::{
        header::{ACCESS_CONTROL_ALLOW_METHODS, CONTENT_TYPE},
        HeaderName, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use reqwest::Client;
use serde::Serialize;
use slping::{DohClient, Resolver, Timeouts};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[macro_use]
extern crate tracing;

const DEFAULT_PORT: u16 = 8080;

/// Shared, read-only request context.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver<DohClient>>,
    pub timeouts: Timeouts,
}

#[tokio::main]
async fn main() {
    start_tracing();
    let port: u16 = std::env::var("PORT").map_or(DEFAULT_PORT, |v| {
        v.parse().expect("PORT must be a valid port number")
    });
    let doh_url =
        std::env::var("DOH_URL").unwrap_or_else(|_| slping::resolve::CLOUDFLARE_DOH.to_owned());
    let http_client = Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(10))
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .expect("failed to build HTTP client");
    info!(%doh_url, "using DNS-over-HTTPS resolver");

    let state = AppState {
        resolver: Arc::new(Resolver::new(DohClient::new(http_client, doh_url))),
        timeouts: Timeouts::default(),
    };
    let socket_address = SocketAddr::from(([0, 0, 0, 0], port));
    let tcp = TcpListener::bind(socket_address)
        .await
        .expect("failed to bind listen address");
    info!(%socket_address, "listening");
    axum::serve(tcp, app(state))
        .with_graceful_shutdown(vss::shutdown_signal())
        .await
        .expect("server error");
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handler::handle_status))
        .route("/healthz", get(|| async { "ok" }))
        .layer(axum::middleware::from_fn(response_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

static ROBOTS_NAME: HeaderName = HeaderName::from_static("x-robots-tag");
static ROBOTS_VALUE: HeaderValue = HeaderValue::from_static("noindex");
static ALLOWED_METHODS: HeaderValue = HeaderValue::from_static("GET");

async fn response_headers(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    resp.headers_mut()
        .insert(ROBOTS_NAME.clone(), ROBOTS_VALUE.clone());
    resp.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS.clone());
    resp
}

pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        static JSON_CTYPE: HeaderValue = HeaderValue::from_static("application/json;charset=utf-8");

        let body = serde_json::to_vec_pretty(&self.0).unwrap_or_else(|_| {
            r#"{"success": false, "message": "JSON serialization failed"}"#
                .as_bytes()
                .to_vec()
        });
        ([(CONTENT_TYPE, JSON_CTYPE.clone())], body).into_response()
    }
}

fn start_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(concat!(env!("CARGO_PKG_NAME"), "=info").parse().unwrap())
        .with_env_var("LOG")
        .from_env()
        .expect("failed to parse env");
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(env_filter)
        .init();
}
