use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};
use uuid::Uuid;

use super::{
    errors_key, lease_key, meta_key, remaining_key, total_key, LeaseToken, ProgressError,
    ProgressResult, ProgressStore, FILE_NAME_FIELD,
};

/// Deletes the lease only while it still holds the caller's token.
const RELEASE_LEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Deletes the four job keys only while the job is finished and its total still
/// matches the one the caller read.
const CLEAR_FINISHED_JOB_SCRIPT: &str = r#"
local total = tonumber(redis.call("GET", KEYS[1]))
local remaining = tonumber(redis.call("GET", KEYS[2]) or "0")
if total == tonumber(ARGV[1]) and remaining <= 0 then
    return redis.call("DEL", KEYS[1], KEYS[2], KEYS[3], KEYS[4])
else
    return 0
end
"#;

impl From<RedisError> for ProgressError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            ProgressError::Unavailable(err.to_string())
        } else {
            ProgressError::Command(err.to_string())
        }
    }
}

/// Redis-backed progress store sharing one auto-reconnecting connection
#[derive(Clone)]
pub struct RedisProgressStore {
    conn: ConnectionManager,
}

impl RedisProgressStore {
    pub async fn connect(redis_url: &str) -> ProgressResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!("Connected to Redis progress store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl ProgressStore for RedisProgressStore {
    #[tracing::instrument(skip(self, file_name), fields(cache.operation = "init_job"))]
    async fn init_job(&self, id: Uuid, total: i64, file_name: &str) -> ProgressResult<()> {
        let mut conn = self.conn.clone();
        let meta = meta_key(id);
        let (): () = redis::pipe()
            .atomic()
            .del(errors_key(id))
            .ignore()
            .del(&meta)
            .ignore()
            .set(total_key(id), total)
            .ignore()
            .set(remaining_key(id), total)
            .ignore()
            .hset(&meta, FILE_NAME_FIELD, file_name)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn decrement_task(&self, id: Uuid) -> ProgressResult<i64> {
        let mut conn = self.conn.clone();
        let remaining: i64 = conn.decr(remaining_key(id), 1).await?;
        Ok(remaining)
    }

    async fn get_total(&self, id: Uuid) -> ProgressResult<i64> {
        let mut conn = self.conn.clone();
        let total: Option<i64> = conn.get(total_key(id)).await?;
        Ok(total.unwrap_or(0))
    }

    async fn get_remaining(&self, id: Uuid) -> ProgressResult<i64> {
        let mut conn = self.conn.clone();
        let remaining: Option<i64> = conn.get(remaining_key(id)).await?;
        Ok(remaining.unwrap_or(0))
    }

    async fn get_errors(&self, id: Uuid) -> ProgressResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let errors: HashMap<String, String> = conn.hgetall(errors_key(id)).await?;
        Ok(errors)
    }

    async fn get_file_name(&self, id: Uuid) -> ProgressResult<String> {
        let mut conn = self.conn.clone();
        let file_name: Option<String> = conn.hget(meta_key(id), FILE_NAME_FIELD).await?;
        Ok(file_name.unwrap_or_default())
    }

    async fn record_error(&self, id: Uuid, slot: &str, message: &str) -> ProgressResult<()> {
        let mut conn = self.conn.clone();
        let (): () = conn.hset(errors_key(id), slot, message).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(cache.operation = "clear_job"))]
    async fn clear_job(&self, id: Uuid) -> ProgressResult<()> {
        let mut conn = self.conn.clone();
        let (): () = redis::pipe()
            .atomic()
            .del(total_key(id))
            .ignore()
            .del(remaining_key(id))
            .ignore()
            .del(errors_key(id))
            .ignore()
            .del(meta_key(id))
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(cache.operation = "clear_finished_job"))]
    async fn clear_finished_job(&self, id: Uuid, observed_total: i64) -> ProgressResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = Script::new(CLEAR_FINISHED_JOB_SCRIPT)
            .key(total_key(id))
            .key(remaining_key(id))
            .key(errors_key(id))
            .key(meta_key(id))
            .arg(observed_total)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn acquire_lease(&self, id: Uuid, ttl: Duration) -> ProgressResult<Option<LeaseToken>> {
        let mut conn = self.conn.clone();
        let token = LeaseToken::generate();
        let acquired: Option<String> = redis::cmd("SET")
            .arg(lease_key(id))
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis().max(1) as u64)
            .query_async(&mut conn)
            .await?;
        Ok(acquired.map(|_| token))
    }

    async fn release_lease(&self, id: Uuid, token: &LeaseToken) -> ProgressResult<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = Script::new(RELEASE_LEASE_SCRIPT)
            .key(lease_key(id))
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    async fn ping(&self) -> ProgressResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
