// src/state.rs
use chrono::Duration;
use std::str::FromStr;
use std::sync::Arc;

use crate::{
    admin::AdminSite,
    auth::hasher::{Argon2Hasher, HashCost, PasswordHasher},
    errors::{TaxiError, TaxiResult},
    services::{
        CarService, DriverOperations, DriverService, ManufacturerService, SessionService, StorageService,
        StoreConfig,
    },
};

pub struct AppState {
    pub storage: Arc<StorageService>,
    pub manufacturer_service: Arc<ManufacturerService>,
    pub driver_service: Arc<DriverService>,
    pub car_service: Arc<CarService>,
    pub session_service: Arc<SessionService>,
    pub admin_site: Arc<AdminSite>,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: Option<String>,
    pub page_size: usize,
    pub session_ttl_secs: i64,
    pub password_hash_cost: HashCost,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            redis_url: None,
            page_size: 5,
            session_ttl_secs: 60 * 60 * 24 * 14, // two weeks
            password_hash_cost: HashCost::default(),
            admin_username: None,
            admin_password: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> TaxiResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source; missing variables
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> TaxiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let config = Self {
            bind_addr: non_empty("TAXI_BIND_ADDR").unwrap_or(defaults.bind_addr),
            redis_url: non_empty("REDIS_URL"),
            page_size: parse_var(&lookup, "TAXI_PAGE_SIZE", defaults.page_size)?,
            session_ttl_secs: parse_var(&lookup, "TAXI_SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            password_hash_cost: defaults.password_hash_cost,
            admin_username: non_empty("TAXI_ADMIN_USERNAME"),
            admin_password: non_empty("TAXI_ADMIN_PASSWORD"),
        };

        if config.page_size == 0 {
            return Err(TaxiError::InvalidConfiguration("TAXI_PAGE_SIZE must be at least 1".to_string()));
        }
        if config.session_ttl_secs <= 0 {
            return Err(TaxiError::InvalidConfiguration(
                "TAXI_SESSION_TTL_SECS must be positive".to_string(),
            ));
        }
        if config.admin_username.is_some() != config.admin_password.is_some() {
            return Err(TaxiError::ConfigurationError(
                "TAXI_ADMIN_USERNAME and TAXI_ADMIN_PASSWORD must be set together".to_string(),
            ));
        }
        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> TaxiResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| TaxiError::InvalidConfiguration(format!("{} has an invalid value: {}", name, raw))),
        _ => Ok(default),
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> TaxiResult<Self> {
        let storage = StorageService::new(StoreConfig {
            redis_url: config.redis_url.clone(),
        })
        .await?;
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: AppConfig, storage: StorageService) -> TaxiResult<Self> {
        let storage = Arc::new(storage);
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(config.password_hash_cost)?);

        let car_service = Arc::new(CarService::new(storage.clone()));
        let manufacturer_service = Arc::new(ManufacturerService::new(storage.clone(), car_service.clone()));
        let driver_service = Arc::new(DriverService::new(storage.clone(), car_service.clone(), hasher));
        let session_service = Arc::new(SessionService::new(
            storage.clone(),
            Duration::seconds(config.session_ttl_secs),
        ));

        Ok(Self {
            storage,
            manufacturer_service,
            driver_service,
            car_service,
            session_service,
            admin_site: Arc::new(AdminSite::taxi()),
            config,
        })
    }

    /// Creates the configured superuser unless an account with that username exists.
    pub async fn bootstrap_admin(&self) -> TaxiResult<()> {
        let (Some(username), Some(password)) = (&self.config.admin_username, &self.config.admin_password) else {
            return Ok(());
        };

        if self.driver_service.get_driver_by_username(username).await?.is_some() {
            tracing::debug!("Superuser {} already exists", username);
            return Ok(());
        }
        self.driver_service.create_superuser(username, password).await?;
        tracing::info!("Created superuser {}", username);
        Ok(())
    }
}
