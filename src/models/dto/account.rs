use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Account;

/// Longest first or last name the `accounts` table can hold, in characters.
pub const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl NewAccount {
    /// Returns the reason the request cannot become an account, if any.
    pub fn validate(&self) -> Result<(), &'static str> {
        for name in [&self.first_name, &self.last_name] {
            if name.trim().is_empty() {
                return Err("first_name and last_name must not be empty");
            }
            if name.chars().count() > MAX_NAME_LEN {
                return Err("first_name and last_name must be at most 255 characters");
            }
        }
        if self.password.is_empty() {
            return Err("password must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteAccount {
    pub id: i32,
}

/// Public view of an account. The password hash is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub number: i32,
    pub balance: i64,
    pub created_at: String,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            number: account.number,
            balance: account.balance,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountDeleted {
    #[serde(rename = "Account deleted")]
    pub account_deleted: i32,
}
