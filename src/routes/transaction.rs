use std::sync::Arc;

use axum::{extract::State, middleware, routing::post, Extension, Json, Router};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    models::{
        dto::{
            DepositRequest, DepositResponse, Message, TransactionReceipt, TransferRequest,
            TransferResponse,
        },
        Error, TokenClaim,
    },
    AppState,
};

use super::{
    middlewares::{auth_guard, Session},
    AppJson,
};

/// Defines the OpenAPI spec for money-movement endpoints
#[derive(OpenApi)]
#[openapi(paths(deposit_handler, transfer_handler))]
pub struct TransactionsApi;

/// Used to group money-movement endpoints together in the OpenAPI documentation
pub const TRANSACTION_API_GROUP: &str = "TRANSACTION";

/// Builds a router for deposit and transfer. Both act on the caller's own account.
pub fn transaction_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/deposit", post(deposit_handler))
        .route("/transactions", post(transfer_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
}

/// Deposit handler function
#[utoipa::path(
    post,
    path = "/deposit",
    tag = TRANSACTION_API_GROUP,
    request_body = DepositRequest,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Deposit applied; carries a fresh token", body = DepositResponse),
        (status = 400, description = "Amount is not positive", body = Message),
        (status = 401, description = "Missing or invalid token", body = Message),
    )
)]
pub async fn deposit_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    AppJson(body): AppJson<DepositRequest>,
) -> Result<Json<DepositResponse>, Error> {
    let number = session.account_number();
    state.db.deposit(body.amount, number).await?;

    let account = state.db.get_account_by_number(number).await?;
    let token = state.keys.issue(&TokenClaim::for_account(&account))?;
    info!(
        account_number = number,
        amount = body.amount,
        balance = account.balance,
        "Deposit completed"
    );

    Ok(Json(DepositResponse {
        balance: account.balance,
        token,
    }))
}

/// Transfer handler function
#[utoipa::path(
    post,
    path = "/transactions",
    tag = TRANSACTION_API_GROUP,
    request_body = TransferRequest,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "Transfer applied; carries a fresh token", body = TransferResponse),
        (status = 400, description = "Bad amount, self-transfer or insufficient funds", body = Message),
        (status = 401, description = "Missing or invalid token", body = Message),
        (status = 404, description = "Destination account does not exist", body = Message),
    )
)]
pub async fn transfer_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    AppJson(body): AppJson<TransferRequest>,
) -> Result<Json<TransferResponse>, Error> {
    let number = session.account_number();
    let transaction = TransactionReceipt::from(&body);
    state
        .db
        .transfer(body.amount, body.to_account, number)
        .await?;

    let account = state.db.get_account_by_number(number).await?;
    let token = state.keys.issue(&TokenClaim::for_account(&account))?;
    info!(
        from = number,
        to = body.to_account,
        amount = body.amount,
        balance = account.balance,
        "Transfer completed"
    );

    Ok(Json(TransferResponse {
        transaction,
        balance: account.balance,
        token,
    }))
}
