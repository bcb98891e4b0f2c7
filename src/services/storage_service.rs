// src/services/storage_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tokio::sync::RwLock;

use crate::errors::{TaxiError as AppError, TaxiResult};

// Storage configuration
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// When unset the service keeps everything in process memory.
    pub redis_url: Option<String>,
}

// Storage key strategies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Simple(String),
    Composite(Vec<String>),
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKey::Simple(key) => write!(f, "{}", key),
            StoreKey::Composite(parts) => write!(f, "{}", parts.join(":")),
        }
    }
}

/// Entity tables kept in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Manufacturer,
    Driver,
    Car,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Manufacturer => "manufacturer",
            Table::Driver => "driver",
            Table::Car => "car",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Table::Manufacturer => "manufacturers",
            Table::Driver => "drivers",
            Table::Car => "cars",
        }
    }
}

// ------------------------------
// Traits (split per data shape)
// ------------------------------

#[async_trait]
pub trait KeyOperations: Send + Sync {
    async fn get(&self, key: &StoreKey) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &StoreKey, value: &str) -> Result<(), StorageError>;
    /// Sets a key that disappears once `ttl` has passed. A non-positive `ttl`
    /// leaves the key absent.
    async fn set_with_ttl(&self, key: &StoreKey, value: &str, ttl: Duration) -> Result<(), StorageError>;
    /// Sets the key only when it does not exist yet; `false` when it did.
    async fn set_if_absent(&self, key: &StoreKey, value: &str) -> Result<bool, StorageError>;
    async fn delete(&self, key: &StoreKey) -> Result<bool, StorageError>;
    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait SetOperations: Send + Sync {
    async fn sadd(&self, key: &StoreKey, member: &str) -> Result<(), StorageError>;
    async fn srem(&self, key: &StoreKey, member: &str) -> Result<(), StorageError>;
    async fn smembers(&self, key: &StoreKey) -> Result<Vec<String>, StorageError>;
    async fn scard(&self, key: &StoreKey) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait CounterOperations: Send + Sync {
    /// Increments the counter and returns the new value; missing counters start at zero.
    async fn incr(&self, key: &StoreKey) -> Result<u64, StorageError>;
}

// Enum to wrap different storage implementations
pub enum Store {
    Redis(RedisStore),
    Memory(MemoryStore),
}

// Redis-based implementation
pub struct RedisStore {
    connection: redis::aio::MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StorageError> {
        let client = Client::open(redis_url).map_err(|e| StorageError::Connection(e.to_string()))?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }

    fn connection(&self) -> redis::aio::MultiplexedConnection {
        self.connection.clone()
    }
}

// -------- Redis impls --------

#[async_trait]
impl KeyOperations for RedisStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection();
        let data: Option<String> = redis::cmd("GET")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(data)
    }

    async fn set(&self, key: &StoreKey, value: &str) -> Result<(), StorageError> {
        let mut conn = self.connection();
        let _: () = redis::cmd("SET")
            .arg(key.to_string())
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn set_with_ttl(&self, key: &StoreKey, value: &str, ttl: Duration) -> Result<(), StorageError> {
        let millis = ttl.num_milliseconds();
        if millis <= 0 {
            self.delete(key).await?;
            return Ok(());
        }
        let mut conn = self.connection();
        let _: () = redis::cmd("SET")
            .arg(key.to_string())
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &StoreKey, value: &str) -> Result<bool, StorageError> {
        let mut conn = self.connection();
        // Nil reply when the key already exists.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key.to_string())
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(reply.is_some())
    }

    async fn delete(&self, key: &StoreKey) -> Result<bool, StorageError> {
        let mut conn = self.connection();
        let removed: u64 = redis::cmd("DEL")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        let mut conn = self.connection();
        let exists: bool = redis::cmd("EXISTS")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(exists)
    }
}

#[async_trait]
impl SetOperations for RedisStore {
    async fn sadd(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        let mut conn = self.connection();
        let _: u64 = redis::cmd("SADD")
            .arg(key.to_string())
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn srem(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        let mut conn = self.connection();
        let _: u64 = redis::cmd("SREM")
            .arg(key.to_string())
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn smembers(&self, key: &StoreKey) -> Result<Vec<String>, StorageError> {
        let mut conn = self.connection();
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(members)
    }

    async fn scard(&self, key: &StoreKey) -> Result<u64, StorageError> {
        let mut conn = self.connection();
        let count: u64 = redis::cmd("SCARD")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(count)
    }
}

#[async_trait]
impl CounterOperations for RedisStore {
    async fn incr(&self, key: &StoreKey) -> Result<u64, StorageError> {
        let mut conn = self.connection();
        let value: u64 = redis::cmd("INCR")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Operation(e.to_string()))?;
        Ok(value)
    }
}

struct MemoryValue {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl MemoryValue {
    fn persistent(value: &str) -> Self {
        Self {
            value: value.to_string(),
            expires_at: None,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now < at)
    }
}

// Memory store for development/testing
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, MemoryValue>>,
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// -------- Memory impls --------

#[async_trait]
impl KeyOperations for MemoryStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<String>, StorageError> {
        let values = self.values.read().await;
        Ok(values
            .get(&key.to_string())
            .filter(|entry| entry.is_live(Utc::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &StoreKey, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().await;
        values.insert(key.to_string(), MemoryValue::persistent(value));
        Ok(())
    }

    async fn set_with_ttl(&self, key: &StoreKey, value: &str, ttl: Duration) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut values = self.values.write().await;
        // Expired keys are swept whenever an expiring key is written.
        values.retain(|_, entry| entry.is_live(now));

        if ttl <= Duration::zero() {
            values.remove(&key.to_string());
            return Ok(());
        }
        values.insert(
            key.to_string(),
            MemoryValue {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(())
    }

    async fn set_if_absent(&self, key: &StoreKey, value: &str) -> Result<bool, StorageError> {
        let mut values = self.values.write().await;
        let key_str = key.to_string();
        if values.get(&key_str).is_some_and(|entry| entry.is_live(Utc::now())) {
            return Ok(false);
        }
        values.insert(key_str, MemoryValue::persistent(value));
        Ok(true)
    }

    async fn delete(&self, key: &StoreKey) -> Result<bool, StorageError> {
        let key_str = key.to_string();
        let removed_value = self
            .values
            .write()
            .await
            .remove(&key_str)
            .is_some_and(|entry| entry.is_live(Utc::now()));
        let removed_set = self.sets.write().await.remove(&key_str).is_some();
        Ok(removed_value || removed_set)
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        let key_str = key.to_string();
        let live_value = self
            .values
            .read()
            .await
            .get(&key_str)
            .is_some_and(|entry| entry.is_live(Utc::now()));
        if live_value {
            return Ok(true);
        }
        Ok(self.sets.read().await.contains_key(&key_str))
    }
}

#[async_trait]
impl SetOperations for MemoryStore {
    async fn sadd(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        let mut sets = self.sets.write().await;
        sets.entry(key.to_string()).or_default().insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        let mut sets = self.sets.write().await;
        let key_str = key.to_string();
        if let Some(set) = sets.get_mut(&key_str) {
            set.remove(member);
            // Redis drops empty sets; mirror that so EXISTS agrees.
            if set.is_empty() {
                sets.remove(&key_str);
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &StoreKey) -> Result<Vec<String>, StorageError> {
        let sets = self.sets.read().await;
        Ok(sets
            .get(&key.to_string())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scard(&self, key: &StoreKey) -> Result<u64, StorageError> {
        let sets = self.sets.read().await;
        Ok(sets.get(&key.to_string()).map(|set| set.len() as u64).unwrap_or(0))
    }
}

#[async_trait]
impl CounterOperations for MemoryStore {
    async fn incr(&self, key: &StoreKey) -> Result<u64, StorageError> {
        let now = Utc::now();
        let mut values = self.values.write().await;
        let entry = values
            .entry(key.to_string())
            .or_insert_with(|| MemoryValue::persistent("0"));
        if !entry.is_live(now) {
            *entry = MemoryValue::persistent("0");
        }
        let current: u64 = entry
            .value
            .parse()
            .map_err(|_| StorageError::Operation(format!("value at {} is not an integer", key)))?;
        let next = current + 1;
        entry.value = next.to_string();
        Ok(next)
    }
}

// ------------------------------
// Enum delegations (Store)
// ------------------------------

#[async_trait]
impl KeyOperations for Store {
    async fn get(&self, key: &StoreKey) -> Result<Option<String>, StorageError> {
        match self {
            Store::Redis(store) => store.get(key).await,
            Store::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &StoreKey, value: &str) -> Result<(), StorageError> {
        match self {
            Store::Redis(store) => store.set(key, value).await,
            Store::Memory(store) => store.set(key, value).await,
        }
    }

    async fn set_with_ttl(&self, key: &StoreKey, value: &str, ttl: Duration) -> Result<(), StorageError> {
        match self {
            Store::Redis(store) => store.set_with_ttl(key, value, ttl).await,
            Store::Memory(store) => store.set_with_ttl(key, value, ttl).await,
        }
    }

    async fn set_if_absent(&self, key: &StoreKey, value: &str) -> Result<bool, StorageError> {
        match self {
            Store::Redis(store) => store.set_if_absent(key, value).await,
            Store::Memory(store) => store.set_if_absent(key, value).await,
        }
    }

    async fn delete(&self, key: &StoreKey) -> Result<bool, StorageError> {
        match self {
            Store::Redis(store) => store.delete(key).await,
            Store::Memory(store) => store.delete(key).await,
        }
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        match self {
            Store::Redis(store) => store.exists(key).await,
            Store::Memory(store) => store.exists(key).await,
        }
    }
}

#[async_trait]
impl SetOperations for Store {
    async fn sadd(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        match self {
            Store::Redis(store) => store.sadd(key, member).await,
            Store::Memory(store) => store.sadd(key, member).await,
        }
    }

    async fn srem(&self, key: &StoreKey, member: &str) -> Result<(), StorageError> {
        match self {
            Store::Redis(store) => store.srem(key, member).await,
            Store::Memory(store) => store.srem(key, member).await,
        }
    }

    async fn smembers(&self, key: &StoreKey) -> Result<Vec<String>, StorageError> {
        match self {
            Store::Redis(store) => store.smembers(key).await,
            Store::Memory(store) => store.smembers(key).await,
        }
    }

    async fn scard(&self, key: &StoreKey) -> Result<u64, StorageError> {
        match self {
            Store::Redis(store) => store.scard(key).await,
            Store::Memory(store) => store.scard(key).await,
        }
    }
}

#[async_trait]
impl CounterOperations for Store {
    async fn incr(&self, key: &StoreKey) -> Result<u64, StorageError> {
        match self {
            Store::Redis(store) => store.incr(key).await,
            Store::Memory(store) => store.incr(key).await,
        }
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation error: {0}")]
    Operation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Connection(msg) => AppError::StorageConnection(msg),
            StorageError::Operation(msg) => AppError::StorageQuery(msg),
            StorageError::Serialization(msg) => AppError::StorageSerialization(msg),
        }
    }
}

// Key generators for the stored resources
pub struct StoreKeys;

impl StoreKeys {
    pub fn record(table: Table, id: u64) -> StoreKey {
        StoreKey::Composite(vec![table.name().to_string(), "id".to_string(), id.to_string()])
    }

    pub fn all(table: Table) -> StoreKey {
        StoreKey::Simple(format!("{}:all", table.plural()))
    }

    pub fn sequence(table: Table) -> StoreKey {
        StoreKey::Composite(vec!["seq".to_string(), table.name().to_string()])
    }

    pub fn driver_by_username(username: &str) -> StoreKey {
        StoreKey::Composite(vec![
            "driver".to_string(),
            "username".to_string(),
            username.to_string(),
        ])
    }

    pub fn driver_by_license(license_number: &str) -> StoreKey {
        StoreKey::Composite(vec![
            "driver".to_string(),
            "license".to_string(),
            license_number.to_string(),
        ])
    }

    pub fn session(session_id: &uuid::Uuid) -> StoreKey {
        StoreKey::Composite(vec!["session".to_string(), "id".to_string(), session_id.to_string()])
    }

    pub fn visit_counter() -> StoreKey {
        StoreKey::Simple("counter:visits".to_string())
    }
}

// Storage service wrapper
pub struct StorageService {
    store: Store,
}

impl StorageService {
    pub async fn new(config: StoreConfig) -> Result<Self, StorageError> {
        match config.redis_url.as_deref() {
            Some(url) => {
                tracing::info!("Connecting to redis storage");
                Ok(Self {
                    store: Store::Redis(RedisStore::connect(url).await?),
                })
            }
            None => {
                tracing::warn!("REDIS_URL not set, keeping fleet data in memory");
                Ok(Self::new_memory())
            }
        }
    }

    pub fn new_memory() -> Self {
        Self {
            store: Store::Memory(MemoryStore::new()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.store {
            Store::Redis(_) => "redis",
            Store::Memory(_) => "memory",
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &StoreKey) -> TaxiResult<Option<T>> {
        match self.store.get(key).await? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &StoreKey, value: &T) -> TaxiResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(key, &json).await?;
        Ok(())
    }

    /// Like [`put_json`](Self::put_json), for a value that expires after `ttl`.
    pub async fn put_json_expiring<T: Serialize>(&self, key: &StoreKey, value: &T, ttl: Duration) -> TaxiResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set_with_ttl(key, &json, ttl).await?;
        Ok(())
    }

    pub async fn get_string(&self, key: &StoreKey) -> TaxiResult<Option<String>> {
        Ok(self.store.get(key).await?)
    }

    pub async fn put_string(&self, key: &StoreKey, value: &str) -> TaxiResult<()> {
        Ok(self.store.set(key, value).await?)
    }

    /// Claims `key` for `value`. `false` when another writer holds it.
    pub async fn put_string_if_absent(&self, key: &StoreKey, value: &str) -> TaxiResult<bool> {
        Ok(self.store.set_if_absent(key, value).await?)
    }

    pub async fn remove(&self, key: &StoreKey) -> TaxiResult<bool> {
        Ok(self.store.delete(key).await?)
    }

    pub async fn incr(&self, key: &StoreKey) -> TaxiResult<u64> {
        Ok(self.store.incr(key).await?)
    }

    /// Allocates the next primary key for `table`; ids start at 1.
    pub async fn next_id(&self, table: Table) -> TaxiResult<u64> {
        self.incr(&StoreKeys::sequence(table)).await
    }

    /// Stores a record and registers it in the table index.
    pub async fn insert_record<T: Serialize>(&self, table: Table, id: u64, value: &T) -> TaxiResult<()> {
        self.put_json(&StoreKeys::record(table, id), value).await?;
        self.store.sadd(&StoreKeys::all(table), &id.to_string()).await?;
        Ok(())
    }

    pub async fn get_record<T: DeserializeOwned>(&self, table: Table, id: u64) -> TaxiResult<Option<T>> {
        self.get_json(&StoreKeys::record(table, id)).await
    }

    pub async fn delete_record(&self, table: Table, id: u64) -> TaxiResult<bool> {
        self.store.srem(&StoreKeys::all(table), &id.to_string()).await?;
        self.remove(&StoreKeys::record(table, id)).await
    }

    /// Ids registered for `table`, ascending.
    pub async fn ids(&self, table: Table) -> TaxiResult<Vec<u64>> {
        let members = self.store.smembers(&StoreKeys::all(table)).await?;
        let mut ids = members
            .iter()
            .map(|member| {
                member
                    .parse::<u64>()
                    .map_err(|_| AppError::StorageSerialization(format!("bad id {} in {}", member, table.plural())))
            })
            .collect::<TaxiResult<Vec<u64>>>()?;
        ids.sort_unstable();
        Ok(ids)
    }

    /// All records of `table` in ascending id order. Index entries whose record
    /// has vanished are skipped.
    pub async fn load_all<T: DeserializeOwned>(&self, table: Table) -> TaxiResult<Vec<T>> {
        let mut records = Vec::new();
        for id in self.ids(table).await? {
            if let Some(record) = self.get_record(table, id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    pub async fn count(&self, table: Table) -> TaxiResult<u64> {
        Ok(self.store.scard(&StoreKeys::all(table)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Row {
        id: u64,
        label: String,
    }

    #[test]
    fn test_key_rendering() {
        assert_eq!(StoreKeys::record(Table::Car, 4).to_string(), "car:id:4");
        assert_eq!(StoreKeys::all(Table::Manufacturer).to_string(), "manufacturers:all");
        assert_eq!(StoreKeys::sequence(Table::Driver).to_string(), "seq:driver");
        assert_eq!(StoreKeys::driver_by_username("bob").to_string(), "driver:username:bob");
        assert_eq!(StoreKeys::driver_by_license("QWE12345").to_string(), "driver:license:QWE12345");
    }

    #[tokio::test]
    async fn test_memory_key_operations() {
        let store = MemoryStore::new();
        let key = StoreKey::Simple("greeting".to_string());

        assert_eq!(store.get(&key).await.unwrap(), None);
        store.set(&key, "hello").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("hello"));
        assert!(store.exists(&key).await.unwrap());
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_sets_and_counters() {
        let store = MemoryStore::new();
        let set = StoreKey::Simple("members".to_string());
        store.sadd(&set, "1").await.unwrap();
        store.sadd(&set, "1").await.unwrap();
        store.sadd(&set, "2").await.unwrap();
        assert_eq!(store.scard(&set).await.unwrap(), 2);

        store.srem(&set, "1").await.unwrap();
        store.srem(&set, "2").await.unwrap();
        assert_eq!(store.smembers(&set).await.unwrap(), Vec::<String>::new());
        assert!(!store.exists(&set).await.unwrap());

        let counter = StoreKeys::visit_counter();
        assert_eq!(store.incr(&counter).await.unwrap(), 1);
        assert_eq!(store.incr(&counter).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_memory_expiring_keys() {
        let store = MemoryStore::new();
        let live = StoreKey::Simple("live".to_string());
        let stale = StoreKey::Simple("stale".to_string());

        store.set_with_ttl(&live, "1", Duration::hours(1)).await.unwrap();
        assert_eq!(store.get(&live).await.unwrap().as_deref(), Some("1"));

        store.set_with_ttl(&stale, "2", Duration::seconds(-1)).await.unwrap();
        assert!(!store.exists(&stale).await.unwrap());

        // A key whose deadline passes is dropped on the next expiring write.
        let expired = MemoryValue {
            value: "2".to_string(),
            expires_at: Some(Utc::now() - Duration::seconds(1)),
        };
        store.values.write().await.insert(stale.to_string(), expired);
        assert_eq!(store.get(&stale).await.unwrap(), None);
        store.set_with_ttl(&live, "3", Duration::hours(1)).await.unwrap();
        assert!(!store.values.read().await.contains_key(&stale.to_string()));
        assert_eq!(store.values.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_set_if_absent() {
        let store = MemoryStore::new();
        let key = StoreKey::Simple("claim".to_string());

        assert!(store.set_if_absent(&key, "first").await.unwrap());
        assert!(!store.set_if_absent(&key, "second").await.unwrap());
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("first"));

        store.delete(&key).await.unwrap();
        assert!(store.set_if_absent(&key, "third").await.unwrap());
    }

    #[tokio::test]
    async fn test_records_are_listed_in_id_order() {
        let storage = StorageService::new_memory();
        assert_eq!(storage.backend_name(), "memory");

        for label in ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k"] {
            let id = storage.next_id(Table::Car).await.unwrap();
            storage
                .insert_record(Table::Car, id, &Row { id, label: label.to_string() })
                .await
                .unwrap();
        }

        // "10" and "11" sort before "2" as strings; ids must sort numerically.
        let ids = storage.ids(Table::Car).await.unwrap();
        assert_eq!(ids, (1..=11).collect::<Vec<u64>>());

        assert!(storage.delete_record(Table::Car, 2).await.unwrap());
        let rows: Vec<Row> = storage.load_all(Table::Car).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[1].label, "c");
        assert_eq!(storage.count(Table::Car).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_a_storage_error() {
        let storage = StorageService::new_memory();
        let key = StoreKeys::record(Table::Manufacturer, 1);
        storage.put_string(&key, "{not json").await.unwrap();
        let result: TaxiResult<Option<Row>> = storage.get_json(&key).await;
        assert!(matches!(result, Err(AppError::StorageSerialization(_))));
    }
}
