//! Test helpers: a migrated PostgreSQL database per test.
//!
//! Migrations path: from the glossa-db crate root, `../../migrations`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

/// Isolated database; the container lives as long as this value.
pub struct TestDb {
    pub pool: PgPool,
    pub _container: ContainerAsync<Postgres>,
}

pub async fn setup_test_db() -> TestDb {
    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start Postgres container");
    let host = container.get_host().await.expect("Failed to get container host");
    let port = container
        .get_host_port_ipv4(5432.tcp())
        .await
        .expect("Failed to get Postgres port");

    let connection_string = format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    TestDb {
        pool,
        _container: container,
    }
}
