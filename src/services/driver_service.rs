// src/services/driver_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::{
    auth::hasher::{self, PasswordHasher},
    errors::TaxiError as AppError,
    models::driver::{Driver, DriverUpdate, NewDriver, UNUSABLE_PASSWORD},
    services::{
        car_service::{CarOperations, CarService},
        storage_service::{StorageService, StoreKeys, Table},
    },
};

#[async_trait]
pub trait DriverOperations: Send + Sync {
    async fn create_user(&self, new_driver: NewDriver) -> Result<Driver, AppError>;
    async fn create_superuser(&self, username: &str, password: &str) -> Result<Driver, AppError>;
    async fn get_driver(&self, driver_id: u64) -> Result<Option<Driver>, AppError>;
    async fn require_driver(&self, driver_id: u64) -> Result<Driver, AppError>;
    async fn get_driver_by_username(&self, username: &str) -> Result<Option<Driver>, AppError>;
    async fn get_driver_by_license(&self, license_number: &str) -> Result<Option<Driver>, AppError>;
    async fn list_drivers(&self) -> Result<Vec<Driver>, AppError>;
    async fn update_driver(&self, driver_id: u64, update: DriverUpdate) -> Result<Driver, AppError>;
    async fn record_login(&self, driver_id: u64) -> Result<Driver, AppError>;
    async fn delete_driver(&self, driver_id: u64) -> Result<(), AppError>;
    async fn count_drivers(&self) -> Result<u64, AppError>;
    /// Returns the driver only when the account is active and the password matches.
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, AppError>;
    async fn check_password(&self, driver: &Driver, password: &str) -> Result<bool, AppError>;
}

pub struct DriverService {
    storage: Arc<StorageService>,
    car_service: Arc<CarService>,
    hasher: Arc<dyn PasswordHasher>,
}

impl DriverService {
    pub fn new(
        storage: Arc<StorageService>,
        car_service: Arc<CarService>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self { storage, car_service, hasher }
    }

    async fn make_password(&self, password: Option<&str>) -> Result<String, AppError> {
        match password {
            Some(raw) => hasher::hash_blocking(&self.hasher, raw).await,
            None => Ok(UNUSABLE_PASSWORD.to_string()),
        }
    }

    async fn save(&self, driver: &Driver) -> Result<(), AppError> {
        self.storage.insert_record(Table::Driver, driver.id, driver).await
    }

    /// Claims `license_number` for the driver. Empty licenses are not indexed.
    async fn claim_license(&self, driver_id: u64, license_number: &str) -> Result<(), AppError> {
        if license_number.is_empty() {
            return Ok(());
        }
        let key = StoreKeys::driver_by_license(license_number);
        if !self.storage.put_string_if_absent(&key, &driver_id.to_string()).await? {
            tracing::warn!("License number {} is already claimed", license_number);
            return Err(AppError::LicenseTaken(license_number.to_string()));
        }
        Ok(())
    }

    async fn release_license(&self, license_number: &str) -> Result<(), AppError> {
        if !license_number.is_empty() {
            self.storage.remove(&StoreKeys::driver_by_license(license_number)).await?;
        }
        Ok(())
    }

    async fn store_new_driver(&self, driver_id: u64, new_driver: NewDriver) -> Result<Driver, AppError> {
        let password = self.make_password(new_driver.password.as_deref()).await?;
        let driver = Driver {
            id: driver_id,
            username: new_driver.username,
            password,
            first_name: new_driver.first_name,
            last_name: new_driver.last_name,
            email: new_driver.email,
            license_number: new_driver.license_number,
            is_staff: new_driver.is_staff,
            is_superuser: new_driver.is_superuser,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };
        self.save(&driver).await?;
        Ok(driver)
    }
}

#[async_trait]
impl DriverOperations for DriverService {
    async fn create_user(&self, new_driver: NewDriver) -> Result<Driver, AppError> {
        tracing::info!("Registering driver: {}", new_driver.username);

        let driver_id = self.storage.next_id(Table::Driver).await?;
        let username_key = StoreKeys::driver_by_username(&new_driver.username);
        if !self
            .storage
            .put_string_if_absent(&username_key, &driver_id.to_string())
            .await?
        {
            return Err(AppError::UsernameTaken(new_driver.username));
        }

        if let Err(err) = self.claim_license(driver_id, &new_driver.license_number).await {
            self.storage.remove(&username_key).await?;
            return Err(err);
        }

        let license_number = new_driver.license_number.clone();
        match self.store_new_driver(driver_id, new_driver).await {
            Ok(driver) => {
                tracing::info!("Driver registered successfully: {}", driver.id);
                Ok(driver)
            }
            Err(err) => {
                self.storage.remove(&username_key).await?;
                self.release_license(&license_number).await?;
                Err(err)
            }
        }
    }

    async fn create_superuser(&self, username: &str, password: &str) -> Result<Driver, AppError> {
        let mut new_driver = NewDriver::new(username).with_password(password);
        new_driver.is_staff = true;
        new_driver.is_superuser = true;
        self.create_user(new_driver).await
    }

    async fn get_driver(&self, driver_id: u64) -> Result<Option<Driver>, AppError> {
        tracing::debug!("Getting driver: {}", driver_id);
        self.storage.get_record(Table::Driver, driver_id).await
    }

    async fn require_driver(&self, driver_id: u64) -> Result<Driver, AppError> {
        self.get_driver(driver_id)
            .await?
            .ok_or(AppError::DriverNotFound(driver_id))
    }

    async fn get_driver_by_username(&self, username: &str) -> Result<Option<Driver>, AppError> {
        tracing::debug!("Getting driver by username: {}", username);

        let Some(raw_id) = self
            .storage
            .get_string(&StoreKeys::driver_by_username(username))
            .await?
        else {
            return Ok(None);
        };
        let driver_id = raw_id
            .parse::<u64>()
            .map_err(|_| AppError::StorageSerialization(format!("bad driver id for {}: {}", username, raw_id)))?;
        self.get_driver(driver_id).await
    }

    async fn get_driver_by_license(&self, license_number: &str) -> Result<Option<Driver>, AppError> {
        if license_number.is_empty() {
            return Ok(None);
        }
        let Some(raw_id) = self
            .storage
            .get_string(&StoreKeys::driver_by_license(license_number))
            .await?
        else {
            return Ok(None);
        };
        let driver_id = raw_id.parse::<u64>().map_err(|_| {
            AppError::StorageSerialization(format!("bad driver id for license {}: {}", license_number, raw_id))
        })?;
        Ok(self
            .get_driver(driver_id)
            .await?
            .filter(|driver| driver.license_number == license_number))
    }

    async fn list_drivers(&self) -> Result<Vec<Driver>, AppError> {
        self.storage.load_all(Table::Driver).await
    }

    async fn update_driver(&self, driver_id: u64, update: DriverUpdate) -> Result<Driver, AppError> {
        tracing::info!("Updating driver: {}", driver_id);

        let mut driver = self.require_driver(driver_id).await?;
        let previous_license = driver.license_number.clone();

        // Apply updates
        if let Some(license_number) = update.license_number {
            if license_number != previous_license {
                self.claim_license(driver.id, &license_number).await?;
            }
            driver.license_number = license_number;
        }
        if let Some(first_name) = update.first_name {
            driver.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            driver.last_name = last_name;
        }
        if let Some(email) = update.email {
            driver.email = email;
        }

        let license_changed = driver.license_number != previous_license;
        if let Err(err) = self.save(&driver).await {
            if license_changed {
                self.release_license(&driver.license_number).await?;
            }
            return Err(err);
        }
        if license_changed {
            self.release_license(&previous_license).await?;
        }
        Ok(driver)
    }

    async fn record_login(&self, driver_id: u64) -> Result<Driver, AppError> {
        let mut driver = self.require_driver(driver_id).await?;
        driver.last_login = Some(Utc::now());
        self.save(&driver).await?;
        Ok(driver)
    }

    async fn delete_driver(&self, driver_id: u64) -> Result<(), AppError> {
        let driver = self.require_driver(driver_id).await?;

        let unassigned = self.car_service.remove_driver_everywhere(driver_id).await?;
        self.storage.delete_record(Table::Driver, driver_id).await?;
        self.storage
            .remove(&StoreKeys::driver_by_username(&driver.username))
            .await?;
        self.release_license(&driver.license_number).await?;

        tracing::info!("Driver deleted: {} (unassigned from {} cars)", driver_id, unassigned);
        Ok(())
    }

    async fn count_drivers(&self) -> Result<u64, AppError> {
        self.storage.count(Table::Driver).await
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<Driver>, AppError> {
        let Some(driver) = self.get_driver_by_username(username).await? else {
            return Ok(None);
        };
        if !driver.is_active || !self.check_password(&driver, password).await? {
            return Ok(None);
        }
        Ok(Some(driver))
    }

    async fn check_password(&self, driver: &Driver, password: &str) -> Result<bool, AppError> {
        if !driver.has_usable_password() {
            return Ok(false);
        }
        hasher::verify_blocking(&self.hasher, password, &driver.password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn test_create_driver_with_license_number() {
        let state = test_support::memory_state();
        let driver = state
            .driver_service
            .create_user(NewDriver::new("test_user").with_password("password123").with_license("QWE12345"))
            .await
            .unwrap();

        assert_eq!(driver.username, "test_user");
        assert_eq!(driver.license_number, "QWE12345");
        assert!(state.driver_service.check_password(&driver, "password123").await.unwrap());
        assert!(!state.driver_service.check_password(&driver, "password124").await.unwrap());
    }

    #[tokio::test]
    async fn test_driver_without_password_cannot_log_in() {
        let state = test_support::memory_state();
        let driver = state
            .driver_service
            .create_user(NewDriver::new("no_password"))
            .await
            .unwrap();

        assert!(!driver.has_usable_password());
        assert!(!state.driver_service.check_password(&driver, "").await.unwrap());
        assert!(state.driver_service.authenticate("no_password", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_is_unique() {
        let state = test_support::memory_state();
        state.driver_service.create_user(NewDriver::new("dup")).await.unwrap();
        let result = state.driver_service.create_user(NewDriver::new("dup")).await;
        assert!(matches!(result, Err(AppError::UsernameTaken(name)) if name == "dup"));
        assert_eq!(state.driver_service.count_drivers().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let state = test_support::memory_state();
        test_support::create_driver(&state, "alice", "alicepass1", "ALC12345").await;

        let found = state.driver_service.authenticate("alice", "alicepass1").await.unwrap();
        assert_eq!(found.map(|d| d.username), Some("alice".to_string()));
        assert!(state.driver_service.authenticate("alice", "wrong").await.unwrap().is_none());
        assert!(state.driver_service.authenticate("bob", "alicepass1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_license_only() {
        let state = test_support::memory_state();
        let driver = test_support::create_driver(&state, "test_name", "password123", "QWE12345").await;

        let update = DriverUpdate {
            license_number: Some("UPD12345".to_string()),
            ..Default::default()
        };
        let updated = state.driver_service.update_driver(driver.id, update).await.unwrap();
        assert_eq!(updated.license_number, "UPD12345");
        assert_eq!(updated.username, "test_name");

        let stored = state.driver_service.require_driver(driver.id).await.unwrap();
        assert_eq!(stored.license_number, "UPD12345");
        assert_eq!(stored.password, driver.password);
    }

    #[tokio::test]
    async fn test_delete_driver_unassigns_cars() {
        let state = test_support::memory_state();
        let manufacturer = test_support::create_manufacturer(&state, "Audi", "Germany").await;
        let keep = test_support::create_driver(&state, "keep", "password123", "KEP12345").await;
        let gone = test_support::create_driver(&state, "gone", "password123", "GON12345").await;
        let car = test_support::create_car(&state, "A4", manufacturer.id, &[keep.id, gone.id]).await;

        state.driver_service.delete_driver(gone.id).await.unwrap();

        assert!(state.driver_service.get_driver(gone.id).await.unwrap().is_none());
        assert!(state.driver_service.get_driver_by_username("gone").await.unwrap().is_none());
        let car = state.car_service.require_car(car.id).await.unwrap();
        assert_eq!(car.driver_ids.into_iter().collect::<Vec<_>>(), vec![keep.id]);

        // The username is free again.
        state.driver_service.create_user(NewDriver::new("gone")).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_login() {
        let state = test_support::memory_state();
        let driver = test_support::create_driver(&state, "carol", "firstpass1", "CRL12345").await;
        assert!(driver.last_login.is_none());

        let driver = state.driver_service.record_login(driver.id).await.unwrap();
        assert!(driver.last_login.is_some());
        let stored = state.driver_service.require_driver(driver.id).await.unwrap();
        assert_eq!(stored.last_login, driver.last_login);
    }

    #[tokio::test]
    async fn test_superuser_is_staff() {
        let state = test_support::memory_state();
        let admin = state.driver_service.create_superuser("admin", "testadmin").await.unwrap();
        assert!(admin.is_staff && admin.is_superuser);
        assert_eq!(admin.license_number, "");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_keep_usernames_unique() {
        let state = test_support::memory_state();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { state.driver_service.create_user(NewDriver::new("dup")).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, AppError::UsernameTaken(_))),
            }
        }
        assert_eq!(created, 1);
        let named_dup = state
            .driver_service
            .list_drivers()
            .await
            .unwrap()
            .into_iter()
            .filter(|driver| driver.username == "dup")
            .count();
        assert_eq!(named_dup, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_keep_licenses_unique() {
        let state = test_support::memory_state();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    let new_driver = NewDriver::new(format!("driver{}", i)).with_license("QWE12345");
                    state.driver_service.create_user(new_driver).await
                })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert!(matches!(err, AppError::LicenseTaken(_))),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(state.driver_service.count_drivers().await.unwrap(), 1);

        // Losing registrations released their usernames.
        let drivers = state.driver_service.list_drivers().await.unwrap();
        for i in 0..8 {
            let username = format!("driver{}", i);
            let found = state.driver_service.get_driver_by_username(&username).await.unwrap();
            assert_eq!(found.is_some(), drivers[0].username == username);
        }
    }

    #[tokio::test]
    async fn test_license_index_follows_updates_and_deletes() {
        let state = test_support::memory_state();
        let service = &state.driver_service;
        let driver = test_support::create_driver(&state, "test_name", "password123", "QWE12345").await;
        assert_eq!(service.get_driver_by_license("QWE12345").await.unwrap().map(|d| d.id), Some(driver.id));

        let update = DriverUpdate {
            license_number: Some("UPD12345".to_string()),
            ..Default::default()
        };
        service.update_driver(driver.id, update.clone()).await.unwrap();
        assert!(service.get_driver_by_license("QWE12345").await.unwrap().is_none());
        assert_eq!(service.get_driver_by_license("UPD12345").await.unwrap().map(|d| d.id), Some(driver.id));

        // Re-submitting the driver's own license is not a conflict.
        service.update_driver(driver.id, update).await.unwrap();

        let other = test_support::create_driver(&state, "other", "password123", "OTH12345").await;
        let steal = DriverUpdate {
            license_number: Some("UPD12345".to_string()),
            ..Default::default()
        };
        let result = service.update_driver(other.id, steal).await;
        assert!(matches!(result, Err(AppError::LicenseTaken(_))));
        assert_eq!(service.require_driver(other.id).await.unwrap().license_number, "OTH12345");

        service.delete_driver(driver.id).await.unwrap();
        assert!(service.get_driver_by_license("UPD12345").await.unwrap().is_none());
        test_support::create_driver(&state, "newcomer", "password123", "UPD12345").await;
    }
}
