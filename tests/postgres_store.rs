//! PostgreSQL store tests.
//!
//! These need a disposable database:
//! `TEST_DATABASE_URL=postgres://... cargo test --test postgres_store -- --ignored`

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use bank_backend::database::{connect_sqlx, open_account, PostgresStorage, Storage, StoreError};
use bank_backend::models::Account;

async fn store() -> PostgresStorage {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = connect_sqlx(&url, Duration::from_secs(5)).await.unwrap();
    let store = PostgresStorage::new(pool);
    store.init().await.unwrap();
    store
}

async fn fresh_account(store: &PostgresStorage, balance: i64) -> Account {
    let account = open_account(store, Account::new("Pg", "Tester", "pw").unwrap())
        .await
        .unwrap();
    if balance > 0 {
        store.deposit(balance, account.number).await.unwrap();
    }
    store.get_account_by_id(account.id).await.unwrap()
}

#[tokio::test]
#[ignore]
async fn create_then_fetch_by_id_and_number() {
    let store = store().await;
    let created = fresh_account(&store, 0).await;

    let by_id = store.get_account_by_id(created.id).await.unwrap();
    let by_number = store.get_account_by_number(created.number).await.unwrap();
    assert_eq!(by_id, by_number);
    assert_eq!(by_id.balance, 0);
    assert_eq!(by_id.first_name, "Pg");
}

#[tokio::test]
#[ignore]
async fn duplicate_number_is_detected() {
    let store = store().await;
    let existing = fresh_account(&store, 0).await;

    let clash = Account {
        number: existing.number,
        ..Account::new("Clash", "Tester", "pw").unwrap()
    };
    let err = store.create_account(&clash).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateNumber(n) if n == existing.number));
}

#[tokio::test]
#[ignore]
async fn delete_is_idempotent() {
    let store = store().await;
    let account = fresh_account(&store, 0).await;

    store.delete_account(account.id).await.unwrap();
    store.delete_account(account.id).await.unwrap();
    assert!(matches!(
        store.get_account_by_id(account.id).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
#[ignore]
async fn transfer_checks_funds_and_preserves_total() {
    let store = store().await;
    let from = fresh_account(&store, 50).await;
    let to = fresh_account(&store, 0).await;

    let err = store.transfer(51, to.number, from.number).await.unwrap_err();
    assert!(matches!(err, StoreError::InsufficientFunds));

    store.transfer(20, to.number, from.number).await.unwrap();
    let from_balance = store.get_account_by_number(from.number).await.unwrap().balance;
    let to_balance = store.get_account_by_number(to.number).await.unwrap().balance;
    assert_eq!((from_balance, to_balance), (30, 20));
}

#[tokio::test]
#[ignore]
async fn transfer_that_would_overflow_the_destination_is_rolled_back() {
    let store = store().await;
    let from = fresh_account(&store, 10).await;
    let to = fresh_account(&store, i64::MAX).await;

    let err = store.transfer(5, to.number, from.number).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidAmount(5)));
    assert_eq!(store.get_account_by_number(from.number).await.unwrap().balance, 10);
    assert_eq!(store.get_account_by_number(to.number).await.unwrap().balance, i64::MAX);
}

#[tokio::test]
#[ignore]
async fn created_at_is_stored_as_given() {
    let store = store().await;
    let draft = Account::new("Pg", "Tester", "pw").unwrap();
    let stored = open_account(&store, draft.clone()).await.unwrap();
    assert_eq!(
        stored.created_at.timestamp_micros(),
        draft.created_at.timestamp_micros()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn racing_transfers_never_overdraw() {
    let store = Arc::new(store().await);
    let source = fresh_account(&store, 100).await.number;
    let mut destinations = Vec::new();
    for _ in 0..20 {
        destinations.push(fresh_account(&store, 0).await.number);
    }

    let handles = destinations.iter().map(|&dest| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.transfer(10, dest, source).await })
    });
    let succeeded = join_all(handles)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(()))))
        .count();

    assert_eq!(succeeded, 10);
    assert_eq!(
        store.get_account_by_number(source).await.unwrap().balance,
        0
    );
}
