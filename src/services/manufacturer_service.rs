// src/services/manufacturer_service.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    models::manufacturer::{Manufacturer, ManufacturerDraft},
    services::{
        car_service::{CarOperations, CarService},
        storage_service::{StorageService, Table},
    },
};

#[async_trait]
pub trait ManufacturerOperations: Send + Sync {
    async fn create_manufacturer(&self, draft: ManufacturerDraft) -> Result<Manufacturer, AppError>;
    async fn get_manufacturer(&self, manufacturer_id: u64) -> Result<Option<Manufacturer>, AppError>;
    async fn require_manufacturer(&self, manufacturer_id: u64) -> Result<Manufacturer, AppError>;
    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError>;
    async fn update_manufacturer(&self, manufacturer_id: u64, draft: ManufacturerDraft) -> Result<Manufacturer, AppError>;
    /// Deletes the manufacturer together with every car it produced.
    async fn delete_manufacturer(&self, manufacturer_id: u64) -> Result<(), AppError>;
    async fn count_manufacturers(&self) -> Result<u64, AppError>;
}

pub struct ManufacturerService {
    storage: Arc<StorageService>,
    car_service: Arc<CarService>,
}

impl ManufacturerService {
    pub fn new(storage: Arc<StorageService>, car_service: Arc<CarService>) -> Self {
        Self { storage, car_service }
    }
}

#[async_trait]
impl ManufacturerOperations for ManufacturerService {
    async fn create_manufacturer(&self, draft: ManufacturerDraft) -> Result<Manufacturer, AppError> {
        let manufacturer = Manufacturer {
            id: self.storage.next_id(Table::Manufacturer).await?,
            name: draft.name,
            country: draft.country,
        };
        self.storage
            .insert_record(Table::Manufacturer, manufacturer.id, &manufacturer)
            .await?;

        tracing::info!("Manufacturer created: {} ({})", manufacturer.id, manufacturer);
        Ok(manufacturer)
    }

    async fn get_manufacturer(&self, manufacturer_id: u64) -> Result<Option<Manufacturer>, AppError> {
        tracing::debug!("Getting manufacturer: {}", manufacturer_id);
        self.storage.get_record(Table::Manufacturer, manufacturer_id).await
    }

    async fn require_manufacturer(&self, manufacturer_id: u64) -> Result<Manufacturer, AppError> {
        self.get_manufacturer(manufacturer_id)
            .await?
            .ok_or(AppError::ManufacturerNotFound(manufacturer_id))
    }

    async fn list_manufacturers(&self) -> Result<Vec<Manufacturer>, AppError> {
        self.storage.load_all(Table::Manufacturer).await
    }

    async fn update_manufacturer(&self, manufacturer_id: u64, draft: ManufacturerDraft) -> Result<Manufacturer, AppError> {
        let mut manufacturer = self.require_manufacturer(manufacturer_id).await?;
        manufacturer.name = draft.name;
        manufacturer.country = draft.country;
        self.storage
            .insert_record(Table::Manufacturer, manufacturer.id, &manufacturer)
            .await?;

        tracing::info!("Manufacturer updated: {}", manufacturer.id);
        Ok(manufacturer)
    }

    async fn delete_manufacturer(&self, manufacturer_id: u64) -> Result<(), AppError> {
        self.require_manufacturer(manufacturer_id).await?;

        let cars = self.car_service.delete_for_manufacturer(manufacturer_id).await?;
        self.storage.delete_record(Table::Manufacturer, manufacturer_id).await?;

        tracing::info!("Manufacturer deleted: {} (with {} cars)", manufacturer_id, cars);
        Ok(())
    }

    async fn count_manufacturers(&self) -> Result<u64, AppError> {
        self.storage.count(Table::Manufacturer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn draft(name: &str, country: &str) -> ManufacturerDraft {
        ManufacturerDraft {
            name: name.to_string(),
            country: country.to_string(),
        }
    }

    #[tokio::test]
    async fn test_crud_round() {
        let state = test_support::memory_state();
        let service = &state.manufacturer_service;

        let old = service.create_manufacturer(draft("Old Name", "Old Country")).await.unwrap();
        assert_eq!(old.to_string(), "Old Name Old Country");

        let updated = service
            .update_manufacturer(old.id, draft("Updated Name", "Updated Country"))
            .await
            .unwrap();
        assert_eq!(updated.id, old.id);
        assert_eq!(service.require_manufacturer(old.id).await.unwrap().name, "Updated Name");

        service.delete_manufacturer(old.id).await.unwrap();
        assert!(service.get_manufacturer(old.id).await.unwrap().is_none());
        assert!(matches!(
            service.delete_manufacturer(old.id).await,
            Err(AppError::ManufacturerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_names_are_not_unique() {
        let state = test_support::memory_state();
        let service = &state.manufacturer_service;
        service.create_manufacturer(draft("Ford", "USA")).await.unwrap();
        service.create_manufacturer(draft("Ford", "USA")).await.unwrap();
        assert_eq!(service.count_manufacturers().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_cars() {
        let state = test_support::memory_state();
        let audi = test_support::create_manufacturer(&state, "Audi", "Germany").await;
        let bmw = test_support::create_manufacturer(&state, "BMW", "Germany").await;
        test_support::create_car(&state, "A4", audi.id, &[]).await;
        test_support::create_car(&state, "A6", audi.id, &[]).await;
        let x5 = test_support::create_car(&state, "X5", bmw.id, &[]).await;

        state.manufacturer_service.delete_manufacturer(audi.id).await.unwrap();

        let cars = state.car_service.list_cars().await.unwrap();
        assert_eq!(cars, vec![x5]);
    }
}
