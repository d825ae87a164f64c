mod account;
mod health;
pub mod middlewares;
mod session;
mod swagger;
mod transaction;
use health::health_checker_handler;
use middlewares::{TOKEN_HEADER, USER_ID_HEADER};
use tower_http::{
    cors::{AllowHeaders, CorsLayer},
    trace::TraceLayer,
};

use crate::{models::Error, AppState};

use axum::{
    extract::FromRequest,
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;

/// JSON body extractor whose rejections render as the crate's JSON [`Error`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

/// Builds the full application router over `state` (used by main and tests).
pub fn make_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(health_checker_handler))
        .route("/api/health", get(health_checker_handler))
        .merge(session::session_routes())
        .merge(account::account_routes(state.clone()))
        .merge(transaction::transaction_routes(state.clone()))
        .merge(swagger::build_documentation())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// CORS policy for the browser frontend at `origin`. Session headers set by
/// login and signup are exposed so client scripts can read them.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(AllowHeaders::any())
        .expose_headers([
            HeaderName::from_static(TOKEN_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
        ])
}
