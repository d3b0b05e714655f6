//! In-memory Storage double for tests
//!
//! Records every put and delete so tests can assert on exact call counts, and
//! can be told to fail puts or deletes.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::{StorageBackend, Visibility};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub key: String,
    pub content_type: String,
    pub visibility: Visibility,
    pub size: usize,
}

#[derive(Default)]
struct MockState {
    files: HashMap<String, Vec<u8>>,
    puts: Vec<PutCall>,
    deletes: Vec<String>,
    /// Puts whose key contains one of these fragments fail
    failing_puts: Vec<String>,
    fail_deletes: bool,
    panic_on_put: Option<String>,
}

/// Mock storage implementation that stores files in memory
#[derive(Clone, Default)]
pub struct MockStorage {
    state: Arc<Mutex<MockState>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a file in the mock storage
    pub fn set_file(&self, key: &str, data: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(key.to_string(), data);
    }

    /// Check if a file exists in the mock storage
    pub fn has_file(&self, key: &str) -> bool {
        self.state.lock().unwrap().files.contains_key(key)
    }

    /// Make every put whose key contains `fragment` fail
    pub fn fail_puts_matching(&self, fragment: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_puts
            .push(fragment.to_string());
    }

    /// Make every put whose key contains `fragment` panic
    pub fn panic_on_put_matching(&self, fragment: &str) {
        self.state.lock().unwrap().panic_on_put = Some(fragment.to_string());
    }

    pub fn fail_deletes(&self) {
        self.state.lock().unwrap().fail_deletes = true;
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.state.lock().unwrap().puts.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        visibility: Visibility,
    ) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.puts.push(PutCall {
            key: storage_key.to_string(),
            content_type: content_type.to_string(),
            visibility,
            size: data.len(),
        });
        if let Some(fragment) = state.panic_on_put.clone() {
            if storage_key.contains(&fragment) {
                drop(state);
                panic!("mock storage panic for {}", storage_key);
            }
        }
        if state
            .failing_puts
            .iter()
            .any(|fragment| storage_key.contains(fragment.as_str()))
        {
            return Err(StorageError::UploadFailed(format!(
                "injected put failure for {}",
                storage_key
            )));
        }
        state.files.insert(storage_key.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        state.deletes.push(storage_key.to_string());
        if state.fail_deletes {
            return Err(StorageError::DeleteFailed(format!(
                "injected delete failure for {}",
                storage_key
            )));
        }
        state.files.remove(storage_key);
        Ok(())
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        Ok(format!("https://example.com/presigned/{}", storage_key))
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("https://example.com/{}", storage_key)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.state.lock().unwrap().files.contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
