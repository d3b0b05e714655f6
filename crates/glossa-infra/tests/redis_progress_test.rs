//! Redis progress store tests.
//!
//! Run with: `cargo test -p glossa-infra --test redis_progress_test`
//! Requires Docker for testcontainers (Redis).

#![cfg(feature = "progress-redis")]

use std::time::Duration;

use glossa_infra::{LeaseToken, ProgressStore, RedisProgressStore};
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::redis::Redis;
use uuid::Uuid;

struct TestRedis {
    store: RedisProgressStore,
    _container: ContainerAsync<Redis>,
}

async fn setup_store() -> TestRedis {
    let container = Redis::default()
        .start()
        .await
        .expect("Failed to start Redis container");
    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(6379.tcp())
        .await
        .expect("Failed to get Redis port");

    let store = RedisProgressStore::connect(&format!("redis://{}:{}", host, port))
        .await
        .expect("Failed to connect to Redis");
    TestRedis {
        store,
        _container: container,
    }
}

#[tokio::test]
async fn test_job_counts_down_and_clears() {
    let redis = setup_store().await;
    let store = &redis.store;
    let id = Uuid::new_v4();

    store.init_job(id, 3, "colors").await.unwrap();
    store.record_error(id, "icon", "boom").await.unwrap();
    for expected in [2, 1, 0] {
        assert_eq!(store.decrement_task(id).await.unwrap(), expected);
    }

    assert_eq!(store.get_total(id).await.unwrap(), 3);
    assert_eq!(store.get_remaining(id).await.unwrap(), 0);
    assert_eq!(store.get_errors(id).await.unwrap()["icon"], "boom");
    assert_eq!(store.get_file_name(id).await.unwrap(), "colors");

    store.clear_job(id).await.unwrap();

    assert_eq!(store.get_total(id).await.unwrap(), 0);
    assert_eq!(store.get_remaining(id).await.unwrap(), 0);
    assert!(store.get_errors(id).await.unwrap().is_empty());
    assert_eq!(store.get_file_name(id).await.unwrap(), "");
}

#[tokio::test]
async fn test_init_job_resets_errors_of_previous_run() {
    let redis = setup_store().await;
    let store = &redis.store;
    let id = Uuid::new_v4();

    store.init_job(id, 1, "a").await.unwrap();
    store.record_error(id, "video", "timeout").await.unwrap();
    store.init_job(id, 2, "b").await.unwrap();

    assert!(store.get_errors(id).await.unwrap().is_empty());
    assert_eq!(store.get_remaining(id).await.unwrap(), 2);
    assert_eq!(store.get_file_name(id).await.unwrap(), "b");
}

#[tokio::test]
async fn test_clear_finished_job_checks_state_first() {
    let redis = setup_store().await;
    let store = &redis.store;
    let id = Uuid::new_v4();

    assert!(!store.clear_finished_job(id, 0).await.unwrap());

    store.init_job(id, 2, "colors").await.unwrap();
    store.decrement_task(id).await.unwrap();
    assert!(!store.clear_finished_job(id, 2).await.unwrap());

    store.decrement_task(id).await.unwrap();
    assert!(!store.clear_finished_job(id, 5).await.unwrap());
    assert_eq!(store.get_total(id).await.unwrap(), 2);

    assert!(store.clear_finished_job(id, 2).await.unwrap());
    assert_eq!(store.get_total(id).await.unwrap(), 0);
    assert_eq!(store.get_file_name(id).await.unwrap(), "");
}

#[tokio::test]
async fn test_lease_is_exclusive_until_released() {
    let redis = setup_store().await;
    let store = &redis.store;
    let id = Uuid::new_v4();
    let ttl = Duration::from_secs(60);

    let token = store.acquire_lease(id, ttl).await.unwrap().unwrap();
    assert!(store.acquire_lease(id, ttl).await.unwrap().is_none());

    assert!(!store
        .release_lease(id, &LeaseToken("someone-else".to_string()))
        .await
        .unwrap());
    assert!(store.release_lease(id, &token).await.unwrap());
    assert!(store.acquire_lease(id, ttl).await.unwrap().is_some());
}

#[tokio::test]
async fn test_lease_expires() {
    let redis = setup_store().await;
    let store = &redis.store;
    let id = Uuid::new_v4();

    store
        .acquire_lease(id, Duration::from_millis(100))
        .await
        .unwrap()
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(store
        .acquire_lease(id, Duration::from_secs(60))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_ping() {
    let redis = setup_store().await;
    redis.store.ping().await.unwrap();
}
