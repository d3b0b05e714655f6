use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{LeaseToken, ProgressResult, ProgressStore};

#[derive(Debug, Default, Clone)]
struct Job {
    total: Option<i64>,
    remaining: Option<i64>,
    errors: HashMap<String, String>,
    file_name: Option<String>,
}

#[derive(Default)]
struct State {
    jobs: HashMap<Uuid, Job>,
    leases: HashMap<Uuid, (LeaseToken, Instant)>,
}

/// Process-local progress store.
///
/// Used when no Redis URL is configured and in tests. Counters follow Redis
/// semantics: decrementing a missing counter starts it from zero.
#[derive(Clone, Default)]
pub struct MemoryProgressStore {
    state: Arc<Mutex<State>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn init_job(&self, id: Uuid, total: i64, file_name: &str) -> ProgressResult<()> {
        let mut state = self.state.lock().await;
        state.jobs.insert(
            id,
            Job {
                total: Some(total),
                remaining: Some(total),
                errors: HashMap::new(),
                file_name: Some(file_name.to_string()),
            },
        );
        Ok(())
    }

    async fn decrement_task(&self, id: Uuid) -> ProgressResult<i64> {
        let mut state = self.state.lock().await;
        let job = state.jobs.entry(id).or_default();
        let remaining = job.remaining.unwrap_or(0) - 1;
        job.remaining = Some(remaining);
        Ok(remaining)
    }

    async fn get_total(&self, id: Uuid) -> ProgressResult<i64> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&id).and_then(|job| job.total).unwrap_or(0))
    }

    async fn get_remaining(&self, id: Uuid) -> ProgressResult<i64> {
        let state = self.state.lock().await;
        Ok(state.jobs.get(&id).and_then(|job| job.remaining).unwrap_or(0))
    }

    async fn get_errors(&self, id: Uuid) -> ProgressResult<HashMap<String, String>> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .get(&id)
            .map(|job| job.errors.clone())
            .unwrap_or_default())
    }

    async fn get_file_name(&self, id: Uuid) -> ProgressResult<String> {
        let state = self.state.lock().await;
        Ok(state
            .jobs
            .get(&id)
            .and_then(|job| job.file_name.clone())
            .unwrap_or_default())
    }

    async fn record_error(&self, id: Uuid, slot: &str, message: &str) -> ProgressResult<()> {
        let mut state = self.state.lock().await;
        state
            .jobs
            .entry(id)
            .or_default()
            .errors
            .insert(slot.to_string(), message.to_string());
        Ok(())
    }

    async fn clear_job(&self, id: Uuid) -> ProgressResult<()> {
        self.state.lock().await.jobs.remove(&id);
        Ok(())
    }

    async fn clear_finished_job(&self, id: Uuid, observed_total: i64) -> ProgressResult<bool> {
        let mut state = self.state.lock().await;
        let finished = state.jobs.get(&id).is_some_and(|job| {
            job.total == Some(observed_total) && job.remaining.unwrap_or(0) <= 0
        });
        if finished {
            state.jobs.remove(&id);
        }
        Ok(finished)
    }

    async fn acquire_lease(&self, id: Uuid, ttl: Duration) -> ProgressResult<Option<LeaseToken>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if let Some((_, expires_at)) = state.leases.get(&id) {
            if *expires_at > now {
                return Ok(None);
            }
        }
        let token = LeaseToken::generate();
        state.leases.insert(id, (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release_lease(&self, id: Uuid, token: &LeaseToken) -> ProgressResult<bool> {
        let mut state = self.state.lock().await;
        match state.leases.get(&id) {
            Some((held, _)) if held == token => {
                state.leases.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> ProgressResult<()> {
        Ok(())
    }
}
