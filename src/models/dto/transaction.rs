use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DepositResponse {
    pub balance: i64,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Account number of the receiving account.
    pub to_account: i32,
    pub amount: i64,
}

/// Echo of an accepted transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionReceipt {
    pub to_account: i32,
    pub amount: i64,
    pub transaction_init_time: String,
}

impl From<&TransferRequest> for TransactionReceipt {
    fn from(request: &TransferRequest) -> Self {
        Self {
            to_account: request.to_account,
            amount: request.amount,
            transaction_init_time: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub transaction: TransactionReceipt,
    pub balance: i64,
    pub token: String,
}
