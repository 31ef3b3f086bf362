//! Test doubles shared by the unit tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::pattern::GlobPattern;
use crate::remote::RemoteCache;

/// Recording in-memory stand-in for the remote tier
#[derive(Default)]
pub(crate) struct MockRemote {
    pub(crate) store: Mutex<HashMap<String, String>>,
    pub(crate) get_calls: Mutex<Vec<String>>,
    pub(crate) set_calls: Mutex<Vec<(String, String, Option<Duration>)>>,
    pub(crate) delete_calls: Mutex<Vec<String>>,
    pub(crate) pattern_deletes: Mutex<Vec<String>>,
    pub(crate) fail_gets: AtomicBool,
}

#[async_trait]
impl RemoteCache for MockRemote {
    async fn get(
        &self,
        key: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
        self.get_calls.lock().unwrap().push(key.to_owned());
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        Ok(self.store.lock().unwrap().get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set_calls
            .lock()
            .unwrap()
            .push((key.to_owned(), value.to_owned(), ttl));
        self.store
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.delete_calls.lock().unwrap().push(key.to_owned());
        self.store.lock().unwrap().remove(key);
        Ok(())
    }

    async fn delete_pattern(
        &self,
        pattern: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pattern_deletes.lock().unwrap().push(pattern.to_owned());
        let glob = GlobPattern::compile(pattern)?;
        self.store.lock().unwrap().retain(|key, _| !glob.matches(key));
        Ok(())
    }
}
