use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use tracing::debug;

use super::{check_amount, check_transfer, Storage, StoreError};
use crate::models::Account;

const UNIQUE_VIOLATION: &str = "23505";
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Connects to a PostgreSQL database with the given `db_url`, returning a connection pool for accessing it.
/// `timeout` bounds both pool acquisition and every statement run on a pooled connection.
pub async fn connect_sqlx(db_url: &str, timeout: Duration) -> Result<PgPool, sqlx::Error> {
    let statement_timeout = format!("SET statement_timeout = {}", timeout.as_millis());
    PgPoolOptions::new()
        .acquire_timeout(timeout)
        .idle_timeout(Duration::from_secs(30))
        .max_connections(32)
        .min_connections(4)
        .after_connect(move |conn, _meta| {
            let statement_timeout = statement_timeout.clone();
            Box::pin(async move {
                conn.execute(statement_timeout.as_str()).await?;
                Ok(())
            })
        })
        .connect(db_url)
        .await
}

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.code().as_deref() == Some(code),
        _ => false,
    }
}

pub struct PostgresStorage {
    sqlx_db: PgPool,
}

impl PostgresStorage {
    pub fn new(sqlx_db: PgPool) -> Self {
        PostgresStorage { sqlx_db }
    }

    /// Applies the embedded schema migrations.
    pub async fn init(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.sqlx_db).await
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn create_account(&self, account: &Account) -> Result<Account, StoreError> {
        debug!(number = account.number, "db: INSERT accounts");
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (first_name, last_name, number, hashed_password, balance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, first_name, last_name, number, hashed_password, balance, created_at
            "#,
        )
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(account.number)
        .bind(&account.hashed_password)
        .bind(account.balance)
        .bind(account.created_at)
        .fetch_one(&self.sqlx_db)
        .await
        .map_err(|e| {
            if has_code(&e, UNIQUE_VIOLATION) {
                StoreError::DuplicateNumber(account.number)
            } else {
                StoreError::Persistence(e)
            }
        })
    }

    async fn get_account_by_id(&self, id: i32) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, hashed_password, balance, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.sqlx_db)
        .await?
        .ok_or_else(|| StoreError::account_not_found(id))
    }

    async fn get_account_by_number(&self, number: i32) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, hashed_password, balance, created_at
            FROM accounts
            WHERE number = $1
            "#,
        )
        .bind(number)
        .fetch_optional(&self.sqlx_db)
        .await?
        .ok_or_else(|| StoreError::number_not_found(number))
    }

    async fn delete_account(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.sqlx_db)
            .await?;
        debug!(id, rows_affected = result.rows_affected(), "db: DELETE account");
        Ok(())
    }

    async fn get_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, first_name, last_name, number, hashed_password, balance, created_at
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.sqlx_db)
        .await?;
        Ok(accounts)
    }

    async fn deposit(&self, amount: i64, account_number: i32) -> Result<(), StoreError> {
        check_amount(amount)?;
        let result = sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE number = $2")
            .bind(amount)
            .bind(account_number)
            .execute(&self.sqlx_db)
            .await
            .map_err(|e| {
                if has_code(&e, NUMERIC_VALUE_OUT_OF_RANGE) {
                    StoreError::InvalidAmount(amount)
                } else {
                    StoreError::Persistence(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::number_not_found(account_number));
        }
        Ok(())
    }

    async fn transfer(
        &self,
        amount: i64,
        to_account_number: i32,
        from_account_number: i32,
    ) -> Result<(), StoreError> {
        check_transfer(amount, to_account_number, from_account_number)?;
        let mut tx = self.sqlx_db.begin().await?;

        // Both rows are locked in number order so opposing transfers queue up
        // instead of deadlocking.
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            r#"
            SELECT number, balance
            FROM accounts
            WHERE number = $1 OR number = $2
            ORDER BY number
            FOR UPDATE
            "#,
        )
        .bind(from_account_number)
        .bind(to_account_number)
        .fetch_all(&mut *tx)
        .await?;

        let balance_of = |number: i32| {
            rows.iter()
                .find(|(n, _)| *n == number)
                .map(|(_, balance)| *balance)
                .ok_or_else(|| StoreError::number_not_found(number))
        };
        let from_balance = balance_of(from_account_number)?;
        let to_balance = balance_of(to_account_number)?;
        if from_balance < amount {
            return Err(StoreError::InsufficientFunds);
        }
        if to_balance.checked_add(amount).is_none() {
            return Err(StoreError::InvalidAmount(amount));
        }

        sqlx::query("UPDATE accounts SET balance = balance - $1 WHERE number = $2")
            .bind(amount)
            .bind(from_account_number)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE number = $2")
            .bind(amount)
            .bind(to_account_number)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(
            amount,
            from = from_account_number,
            to = to_account_number,
            "db: transfer committed"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.sqlx_db).await?;
        Ok(())
    }
}
