//! Record store abstraction over locations and lookup history.
//!
//! `PgStore` is the production backend. Tests use the in-memory store in
//! [`memory`], which follows the same upsert-by-`zmw` rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::models::{Location, LookupEntry};
use super::queries;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Most recent lookup whose raw input equals `user_input`.
    async fn find_latest_lookup(&self, user_input: &str)
        -> Result<Option<LookupEntry>, sqlx::Error>;

    /// Stored location with the given `zmw`, if any.
    async fn find_location(&self, zmw: &str) -> Result<Option<Location>, sqlx::Error>;

    /// Insert or merge a location by `zmw`, returning the stored copy.
    async fn upsert_location(&self, location: &Location) -> Result<Location, sqlx::Error>;

    /// Record that `user_input` resolved to `location` at `at`.
    async fn append_lookup(
        &self,
        user_input: &str,
        location: &Location,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;
}

/// Postgres-backed record store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whether the database answers a trivial query.
    pub async fn ping(&self) -> bool {
        queries::ping(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_latest_lookup(
        &self,
        user_input: &str,
    ) -> Result<Option<LookupEntry>, sqlx::Error> {
        queries::find_latest_lookup(&self.pool, user_input).await
    }

    async fn find_location(&self, zmw: &str) -> Result<Option<Location>, sqlx::Error> {
        queries::find_location(&self.pool, zmw).await
    }

    async fn upsert_location(&self, location: &Location) -> Result<Location, sqlx::Error> {
        queries::upsert_location(&self.pool, location).await
    }

    async fn append_lookup(
        &self,
        user_input: &str,
        location: &Location,
        at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        queries::insert_lookup(&self.pool, user_input, &location.zmw, at).await
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Inner {
        locations: HashMap<String, Location>,
        /// (user_input, zmw, looked_up_at), in insertion order.
        lookups: Vec<(String, String, DateTime<Utc>)>,
    }

    /// In-memory record store for tests.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn location(&self, zmw: &str) -> Option<Location> {
            self.inner.lock().unwrap().locations.get(zmw).cloned()
        }

        pub fn location_count(&self) -> usize {
            self.inner.lock().unwrap().locations.len()
        }

        pub fn lookups(&self) -> Vec<(String, String, DateTime<Utc>)> {
            self.inner.lock().unwrap().lookups.clone()
        }
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn find_latest_lookup(
            &self,
            user_input: &str,
        ) -> Result<Option<LookupEntry>, sqlx::Error> {
            let inner = self.inner.lock().unwrap();
            let latest = inner
                .lookups
                .iter()
                .filter(|(input, _, _)| input == user_input)
                .max_by_key(|(_, _, at)| *at);
            Ok(latest.and_then(|(input, zmw, at)| {
                inner.locations.get(zmw).map(|location| LookupEntry {
                    user_input: input.clone(),
                    looked_up_at: *at,
                    location: location.clone(),
                })
            }))
        }

        async fn find_location(&self, zmw: &str) -> Result<Option<Location>, sqlx::Error> {
            Ok(self.location(zmw))
        }

        async fn upsert_location(&self, location: &Location) -> Result<Location, sqlx::Error> {
            let mut inner = self.inner.lock().unwrap();
            let mut stored = location.clone();
            if stored.last_updated.is_none() {
                stored.last_updated = inner
                    .locations
                    .get(&location.zmw)
                    .and_then(|existing| existing.last_updated);
            }
            inner.locations.insert(stored.zmw.clone(), stored.clone());
            Ok(stored)
        }

        async fn append_lookup(
            &self,
            user_input: &str,
            location: &Location,
            at: DateTime<Utc>,
        ) -> Result<(), sqlx::Error> {
            let mut inner = self.inner.lock().unwrap();
            inner
                .lookups
                .push((user_input.to_string(), location.zmw.clone(), at));
            Ok(())
        }
    }

    mod tests {
        use super::*;
        use chrono::Duration;

        #[tokio::test]
        async fn test_latest_lookup_wins() {
            let store = MemoryStore::new();
            let now = Utc::now();
            let old = Location::new("1", "/q/1", "Old");
            let new = Location::new("2", "/q/2", "New");
            store.upsert_location(&old).await.unwrap();
            store.upsert_location(&new).await.unwrap();
            store.append_lookup("x", &new, now).await.unwrap();
            store
                .append_lookup("x", &old, now - Duration::hours(1))
                .await
                .unwrap();

            let entry = store.find_latest_lookup("x").await.unwrap().unwrap();
            assert_eq!(entry.location.zmw, "2");
            assert!(store.find_latest_lookup("y").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_upsert_merges_by_zmw() {
            let store = MemoryStore::new();
            let mut loc = Location::new("1", "/q/1", "One");
            store.upsert_location(&loc).await.unwrap();
            loc.cache = "[]".to_string();
            store.upsert_location(&loc).await.unwrap();

            assert_eq!(store.location_count(), 1);
            assert_eq!(store.location("1").unwrap().cache, "[]");
        }

        #[tokio::test]
        async fn test_upsert_without_refresh_keeps_last_updated() {
            let store = MemoryStore::new();
            let refreshed = Utc::now();
            let mut loc = Location::new("1", "/q/1", "One");
            loc.last_updated = Some(refreshed);
            store.upsert_location(&loc).await.unwrap();

            let blank = Location::new("1", "/q/1", "One");
            let stored = store.upsert_location(&blank).await.unwrap();

            assert_eq!(stored.last_updated, Some(refreshed));
            assert_eq!(store.location("1").unwrap().last_updated, Some(refreshed));
            assert_eq!(store.find_location("1").await.unwrap(), Some(stored));
            assert!(store.find_location("2").await.unwrap().is_none());
        }
    }
}
