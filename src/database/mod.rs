mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::models::Account;

pub use memory::MemoryStorage;
pub use postgres::{connect_sqlx, PostgresStorage};

/// How many fresh account numbers are tried before giving up on a create.
pub const MAX_NUMBER_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("account number {0} is already taken")]
    DuplicateNumber(i32),
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
    #[error("cannot transfer to the same account")]
    InvalidTransfer,
    #[error("insufficient funds in your account")]
    InsufficientFunds,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl StoreError {
    pub fn account_not_found(id: i32) -> Self {
        Self::NotFound(format!("account {id} not found"))
    }

    pub fn number_not_found(number: i32) -> Self {
        Self::NotFound(format!("account with number [{number}] not found"))
    }
}

/// Account persistence. The only code path allowed to change a balance.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Inserts `account` and returns the stored row with its assigned `id`.
    async fn create_account(&self, account: &Account) -> Result<Account, StoreError>;

    async fn get_account_by_id(&self, id: i32) -> Result<Account, StoreError>;

    async fn get_account_by_number(&self, number: i32) -> Result<Account, StoreError>;

    /// Removes the account. Deleting an id that does not exist succeeds.
    async fn delete_account(&self, id: i32) -> Result<(), StoreError>;

    /// Every account, ordered by `id` ascending.
    async fn get_all_accounts(&self) -> Result<Vec<Account>, StoreError>;

    async fn deposit(&self, amount: i64, account_number: i32) -> Result<(), StoreError>;

    /// Moves `amount` from `from_account_number` to `to_account_number` as a
    /// single atomic unit. Neither balance changes when this returns an error.
    async fn transfer(
        &self,
        amount: i64,
        to_account_number: i32,
        from_account_number: i32,
    ) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub(crate) fn check_amount(amount: i64) -> Result<(), StoreError> {
    if amount <= 0 {
        return Err(StoreError::InvalidAmount(amount));
    }
    Ok(())
}

pub(crate) fn check_transfer(amount: i64, to: i32, from: i32) -> Result<(), StoreError> {
    check_amount(amount)?;
    if to == from {
        return Err(StoreError::InvalidTransfer);
    }
    Ok(())
}

/// Persists a new account under a freshly drawn number, drawing again when the
/// number collides with an existing account.
pub async fn open_account(store: &dyn Storage, mut account: Account) -> Result<Account, StoreError> {
    let mut last_error = StoreError::DuplicateNumber(account.number);
    for attempt in 1..=MAX_NUMBER_ATTEMPTS {
        account.number = Account::generate_number();
        match store.create_account(&account).await {
            Err(StoreError::DuplicateNumber(number)) => {
                warn!(number, attempt, "Account number collision, retrying");
                last_error = StoreError::DuplicateNumber(number);
            }
            result => return result,
        }
    }
    Err(last_error)
}
