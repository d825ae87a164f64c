use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{check_amount, check_transfer, Storage, StoreError};
use crate::models::Account;

/// In-process store. Every mutation takes the write lock, so a transfer's
/// balance check and both writes happen without interleaving.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Accounts>,
}

#[derive(Debug, Default)]
struct Accounts {
    last_id: i32,
    by_id: BTreeMap<i32, Account>,
    id_by_number: HashMap<i32, i32>,
}

impl Accounts {
    fn by_number_mut(&mut self, number: i32) -> Result<&mut Account, StoreError> {
        self.id_by_number
            .get(&number)
            .and_then(|id| self.by_id.get_mut(id))
            .ok_or_else(|| StoreError::number_not_found(number))
    }

    fn balance_of(&self, number: i32) -> Result<i64, StoreError> {
        self.id_by_number
            .get(&number)
            .and_then(|id| self.by_id.get(id))
            .map(|account| account.balance)
            .ok_or_else(|| StoreError::number_not_found(number))
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_account(&self, account: &Account) -> Result<Account, StoreError> {
        let mut accounts = self.inner.write().await;
        if accounts.id_by_number.contains_key(&account.number) {
            return Err(StoreError::DuplicateNumber(account.number));
        }

        accounts.last_id += 1;
        let stored = Account {
            id: accounts.last_id,
            ..account.clone()
        };
        accounts.id_by_number.insert(stored.number, stored.id);
        accounts.by_id.insert(stored.id, stored.clone());
        debug!(id = stored.id, number = stored.number, "memory: account inserted");
        Ok(stored)
    }

    async fn get_account_by_id(&self, id: i32) -> Result<Account, StoreError> {
        self.inner
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::account_not_found(id))
    }

    async fn get_account_by_number(&self, number: i32) -> Result<Account, StoreError> {
        let accounts = self.inner.read().await;
        accounts
            .id_by_number
            .get(&number)
            .and_then(|id| accounts.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::number_not_found(number))
    }

    async fn delete_account(&self, id: i32) -> Result<(), StoreError> {
        let mut accounts = self.inner.write().await;
        if let Some(account) = accounts.by_id.remove(&id) {
            accounts.id_by_number.remove(&account.number);
        }
        Ok(())
    }

    async fn get_all_accounts(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.inner.read().await.by_id.values().cloned().collect())
    }

    async fn deposit(&self, amount: i64, account_number: i32) -> Result<(), StoreError> {
        check_amount(amount)?;
        let mut accounts = self.inner.write().await;
        let account = accounts.by_number_mut(account_number)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount(amount))?;
        Ok(())
    }

    async fn transfer(
        &self,
        amount: i64,
        to_account_number: i32,
        from_account_number: i32,
    ) -> Result<(), StoreError> {
        check_transfer(amount, to_account_number, from_account_number)?;
        let mut accounts = self.inner.write().await;

        let from_balance = accounts.balance_of(from_account_number)?;
        let to_balance = accounts.balance_of(to_account_number)?;
        if from_balance < amount {
            return Err(StoreError::InsufficientFunds);
        }
        let credited = to_balance
            .checked_add(amount)
            .ok_or(StoreError::InvalidAmount(amount))?;

        accounts.by_number_mut(from_account_number)?.balance = from_balance - amount;
        accounts.by_number_mut(to_account_number)?.balance = credited;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
