use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    database::open_account,
    models::{
        dto::{AccountDeleted, AccountResponse, DeleteAccount, Message, NewAccount},
        Account, Error, TokenClaim,
    },
    AppState,
};

use super::{
    middlewares::{auth_guard, owner_guard, resolve_owned, Authorized, Session, TOKEN_HEADER},
    AppJson,
};

/// Defines the OpenAPI spec for account endpoints
#[derive(OpenApi)]
#[openapi(paths(
    create_account_handler,
    get_accounts_handler,
    delete_account_handler,
    get_account_handler,
    delete_account_by_id_handler
))]
pub struct AccountsApi;

/// Used to group account endpoints together in the OpenAPI documentation
pub const ACCOUNT_API_GROUP: &str = "ACCOUNT";

/// Builds a router for account routes.
///
/// `route_layer` only wraps the methods registered before it, so account
/// creation stays public while listing and deleting require a session.
pub fn account_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/accounts",
            get(get_accounts_handler)
                .delete(delete_account_handler)
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
                .post(create_account_handler),
        )
        .route(
            "/accounts/:id",
            get(get_account_handler)
                .delete(delete_account_by_id_handler)
                .route_layer(middleware::from_fn_with_state(state.clone(), owner_guard))
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard)),
        )
}

/// Create account handler function
#[utoipa::path(
    post,
    path = "/accounts",
    tag = ACCOUNT_API_GROUP,
    request_body = NewAccount,
    responses(
        (status = 201, description = "Account successfully created", body = AccountResponse),
        (status = 400, description = "Malformed request or invalid field", body = Message),
    )
)]
pub async fn create_account_handler(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<NewAccount>,
) -> Result<impl IntoResponse, Error> {
    body.validate().map_err(|reason| Error::new(StatusCode::BAD_REQUEST, reason))?;
    let draft = Account::new(&body.first_name, &body.last_name, &body.password)?;
    let account = open_account(state.db.as_ref(), draft).await?;
    let token = state.keys.issue(&TokenClaim::for_account(&account))?;

    info!(id = account.id, number = account.number, "Account created");
    Ok((
        StatusCode::CREATED,
        [(TOKEN_HEADER, token)],
        Json(AccountResponse::from(account)),
    ))
}

/// List accounts handler function
#[utoipa::path(
    get,
    path = "/accounts",
    tag = ACCOUNT_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "All accounts ordered by id", body = [AccountResponse]),
        (status = 401, description = "Missing or invalid token", body = Message),
    )
)]
pub async fn get_accounts_handler(
    State(state): State<Arc<AppState>>,
    Extension(_session): Extension<Session>,
) -> Result<Json<Vec<AccountResponse>>, Error> {
    let accounts = state.db.get_all_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Delete account (id in body) handler function
#[utoipa::path(
    delete,
    path = "/accounts",
    tag = ACCOUNT_API_GROUP,
    request_body = DeleteAccount,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Account deleted", body = AccountDeleted),
        (status = 401, description = "Missing or invalid token", body = Message),
        (status = 403, description = "Account belongs to someone else", body = Message),
    )
)]
pub async fn delete_account_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    AppJson(body): AppJson<DeleteAccount>,
) -> Result<Json<AccountDeleted>, Error> {
    let authorized = resolve_owned(&state, &session, body.id).await?;
    delete_owned(&state, authorized).await
}

/// Get account handler function
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = ACCOUNT_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Account found", body = AccountResponse),
        (status = 401, description = "Missing or invalid token", body = Message),
        (status = 403, description = "Account belongs to someone else", body = Message),
    ),
    params(
        ("id" = i32, Path, description = "Account ID")
    )
)]
pub async fn get_account_handler(
    Extension(authorized): Extension<Authorized>,
) -> Json<AccountResponse> {
    Json(AccountResponse::from(authorized.into_account()))
}

/// Delete account (id in path) handler function
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    tag = ACCOUNT_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Account deleted", body = AccountDeleted),
        (status = 401, description = "Missing or invalid token", body = Message),
        (status = 403, description = "Account belongs to someone else", body = Message),
    ),
    params(
        ("id" = i32, Path, description = "Account ID")
    )
)]
pub async fn delete_account_by_id_handler(
    State(state): State<Arc<AppState>>,
    Extension(authorized): Extension<Authorized>,
) -> Result<Json<AccountDeleted>, Error> {
    delete_owned(&state, authorized).await
}

async fn delete_owned(state: &AppState, authorized: Authorized) -> Result<Json<AccountDeleted>, Error> {
    let id = authorized.account().id;
    state.db.delete_account(id).await?;
    info!(id, number = authorized.account().number, "Account deleted");
    Ok(Json(AccountDeleted { account_deleted: id }))
}
