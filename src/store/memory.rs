use super::{StoreError, UserRecord, UserStore};
use async_trait::async_trait;
use std::collections::{hash_map::Entry, HashMap};
use tokio::sync::RwLock;

/// Process-local store for development and tests. Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        // Check and insert under one write lock.
        match self.users.write().await.entry(record.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(username: &str, salt: &str) -> UserRecord {
        UserRecord::new(username, salt.to_string(), "00".repeat(32))
    }

    #[tokio::test]
    async fn create_then_get() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        assert!(store.get_user("foo").await?.is_none());

        store.create_user(&record("foo", "s1")).await?;
        let fetched = store.get_user("foo").await?;
        assert_eq!(fetched.map(|r| r.salt), Some("s1".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_is_a_conflict_and_keeps_the_first_record() -> Result<(), StoreError> {
        let store = MemoryStore::new();
        store.create_user(&record("foo", "first")).await?;

        let second = store.create_user(&record("foo", "second")).await;
        assert!(matches!(second, Err(StoreError::Conflict)));

        let fetched = store.get_user("foo").await?;
        assert_eq!(fetched.map(|r| r.salt), Some("first".to_string()));
        assert_eq!(store.user_count().await, 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_have_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create_user(&record("race", &format!("s{i}"))).await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => created += 1,
                Ok(Err(StoreError::Conflict)) => conflicts += 1,
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(store.user_count().await, 1);
    }
}
