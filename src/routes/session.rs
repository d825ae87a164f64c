use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::post, Json, Router};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::{
    database::StoreError,
    models::{
        dto::{LoginInfo, Message, TokenResponse},
        AuthError, Error, TokenClaim,
    },
    AppState,
};

use super::{
    middlewares::{TOKEN_HEADER, USER_ID_HEADER},
    AppJson,
};

#[derive(OpenApi)]
#[openapi(paths(login_handler, logout_handler))]
/// Defines the OpenAPI spec for session endpoints
pub struct SessionApi;

/// Used to group session endpoints together in the OpenAPI documentation
pub const SESSION_API_GROUP: &str = "SESSION";

/// Builds a router for login and logout
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
}

// Login handler function
#[utoipa::path(
    post,
    path = "/login",
    tag = SESSION_API_GROUP,
    request_body = LoginInfo,
    responses(
        (status = 200, description = "Credentials accepted", body = TokenResponse),
        (status = 401, description = "Unknown account or wrong password", body = Message),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginInfo>,
) -> Result<impl IntoResponse, Error> {
    let account = match state.db.get_account_by_number(body.account_number).await {
        Ok(account) => account,
        Err(StoreError::NotFound(_)) => {
            warn!(account_number = body.account_number, "Login for unknown account");
            return Err(AuthError::Unauthenticated.into());
        }
        Err(e) => return Err(e.into()),
    };

    match account.password_matches(&body.password) {
        Ok(()) => {}
        Err(argon2::password_hash::Error::Password) => {
            warn!(account_number = account.number, "Login with wrong password");
            return Err(AuthError::Unauthenticated.into());
        }
        Err(e) => return Err(e.into()),
    }

    let token = state.keys.issue(&TokenClaim::for_account(&account))?;
    info!(account_number = account.number, "Login succeeded");

    Ok((
        [
            (TOKEN_HEADER, token.clone()),
            (USER_ID_HEADER, account.id.to_string()),
        ],
        Json(TokenResponse {
            token,
            account_number: account.number,
        }),
    ))
}

/// Tokens are stateless, so logging out only tells the client to drop its copy.
#[utoipa::path(
    post,
    path = "/logout",
    tag = SESSION_API_GROUP,
    responses(
        (status = 200, description = "Client should discard its token", body = Message),
    )
)]
pub async fn logout_handler() -> impl IntoResponse {
    (
        [(TOKEN_HEADER, ""), (USER_ID_HEADER, "")],
        Json(Message::new("Logged out")),
    )
}
