//! Concurrent balance mutation tests
//!
//! Many tasks race against the same source account. Whatever the
//! interleaving, the source must never go negative and money must be neither
//! created nor destroyed.

use std::sync::Arc;

use futures::future::join_all;

use bank_backend::database::{MemoryStorage, Storage, StoreError};
use bank_backend::models::Account;

const TASK_COUNT: usize = 64;

async fn seeded(store: &MemoryStorage, number: i32, balance: i64) {
    store
        .create_account(&Account {
            first_name: "Concurrent".into(),
            last_name: number.to_string(),
            number,
            ..Default::default()
        })
        .await
        .unwrap();
    if balance > 0 {
        store.deposit(balance, number).await.unwrap();
    }
}

async fn balance(store: &MemoryStorage, number: i32) -> i64 {
    store.get_account_by_number(number).await.unwrap().balance
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_transfers_never_overdraw_the_source() {
    let store = Arc::new(MemoryStorage::new());
    let source = 1;
    seeded(&store, source, 100).await;
    for dest in 0..TASK_COUNT as i32 {
        seeded(&store, 1_000 + dest, 0).await;
    }

    // Each transfer is fundable on its own; only ten fit if they serialize.
    let handles = (0..TASK_COUNT as i32).map(|dest| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.transfer(10, 1_000 + dest, source).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::InsufficientFunds)))
        .count();
    assert_eq!(succeeded, 10);
    assert_eq!(refused, TASK_COUNT - 10);
    assert_eq!(balance(&store, source).await, 0);

    let mut total = balance(&store, source).await;
    for dest in 0..TASK_COUNT as i32 {
        total += balance(&store, 1_000 + dest).await;
    }
    assert_eq!(total, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn opposing_transfers_preserve_the_total() {
    let store = Arc::new(MemoryStorage::new());
    seeded(&store, 1, 500).await;
    seeded(&store, 2, 500).await;

    let handles = (0..TASK_COUNT).map(|i| {
        let store = Arc::clone(&store);
        let (to, from) = if i % 2 == 0 { (1, 2) } else { (2, 1) };
        tokio::spawn(async move { store.transfer(7, to, from).await })
    });
    for joined in join_all(handles).await {
        joined.unwrap().unwrap();
    }

    let a = balance(&store, 1).await;
    let b = balance(&store, 2).await;
    assert!(a >= 0 && b >= 0);
    assert_eq!(a + b, 1_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_deposits_are_not_lost() {
    let store = Arc::new(MemoryStorage::new());
    seeded(&store, 1, 0).await;

    let handles = (1..=TASK_COUNT as i64).map(|amount| {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.deposit(amount, 1).await })
    });
    for joined in join_all(handles).await {
        joined.unwrap().unwrap();
    }

    let expected = (TASK_COUNT as i64) * (TASK_COUNT as i64 + 1) / 2;
    assert_eq!(balance(&store, 1).await, expected);
}
