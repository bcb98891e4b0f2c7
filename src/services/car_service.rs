// src/services/car_service.rs
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    errors::TaxiError as AppError,
    models::{
        car::{Car, CarDetail, CarDraft},
        driver::{Driver, DriverResponse},
        manufacturer::Manufacturer,
    },
    services::storage_service::{StorageService, Table},
};

#[async_trait]
pub trait CarOperations: Send + Sync {
    async fn create_car(&self, draft: CarDraft) -> Result<Car, AppError>;
    async fn get_car(&self, car_id: u64) -> Result<Option<Car>, AppError>;
    async fn require_car(&self, car_id: u64) -> Result<Car, AppError>;
    async fn list_cars(&self) -> Result<Vec<Car>, AppError>;
    async fn update_car(&self, car_id: u64, draft: CarDraft) -> Result<Car, AppError>;
    async fn delete_car(&self, car_id: u64) -> Result<(), AppError>;
    async fn count_cars(&self) -> Result<u64, AppError>;
    async fn car_detail(&self, car: &Car) -> Result<CarDetail, AppError>;
    async fn cars_for_driver(&self, driver_id: u64) -> Result<Vec<Car>, AppError>;
    async fn cars_for_manufacturer(&self, manufacturer_id: u64) -> Result<Vec<Car>, AppError>;
    /// Assigns the driver to the car, or unassigns them if already assigned.
    async fn toggle_driver(&self, car_id: u64, driver_id: u64) -> Result<Car, AppError>;
    async fn remove_driver_everywhere(&self, driver_id: u64) -> Result<usize, AppError>;
    async fn delete_for_manufacturer(&self, manufacturer_id: u64) -> Result<usize, AppError>;
}

pub struct CarService {
    storage: Arc<StorageService>,
}

impl CarService {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self { storage }
    }

    // Foreign keys are checked here as well as in the form layer so that
    // callers bypassing forms cannot store dangling references.
    async fn check_references(&self, draft: &CarDraft) -> Result<(), AppError> {
        let manufacturer: Option<Manufacturer> = self
            .storage
            .get_record(Table::Manufacturer, draft.manufacturer_id)
            .await?;
        if manufacturer.is_none() {
            return Err(AppError::ManufacturerNotFound(draft.manufacturer_id));
        }

        for driver_id in &draft.driver_ids {
            let driver: Option<Driver> = self.storage.get_record(Table::Driver, *driver_id).await?;
            if driver.is_none() {
                return Err(AppError::DriverNotFound(*driver_id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CarOperations for CarService {
    async fn create_car(&self, draft: CarDraft) -> Result<Car, AppError> {
        self.check_references(&draft).await?;

        let car = Car {
            id: self.storage.next_id(Table::Car).await?,
            model: draft.model,
            manufacturer_id: draft.manufacturer_id,
            driver_ids: draft.driver_ids,
        };
        self.storage.insert_record(Table::Car, car.id, &car).await?;

        tracing::info!("Car created: {} ({})", car.id, car.model);
        Ok(car)
    }

    async fn get_car(&self, car_id: u64) -> Result<Option<Car>, AppError> {
        tracing::debug!("Getting car: {}", car_id);
        self.storage.get_record(Table::Car, car_id).await
    }

    async fn require_car(&self, car_id: u64) -> Result<Car, AppError> {
        self.get_car(car_id).await?.ok_or(AppError::CarNotFound(car_id))
    }

    async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        self.storage.load_all(Table::Car).await
    }

    async fn update_car(&self, car_id: u64, draft: CarDraft) -> Result<Car, AppError> {
        let mut car = self.require_car(car_id).await?;
        self.check_references(&draft).await?;

        car.model = draft.model;
        car.manufacturer_id = draft.manufacturer_id;
        car.driver_ids = draft.driver_ids;
        self.storage.insert_record(Table::Car, car.id, &car).await?;

        tracing::info!("Car updated: {}", car.id);
        Ok(car)
    }

    async fn delete_car(&self, car_id: u64) -> Result<(), AppError> {
        if !self.storage.delete_record(Table::Car, car_id).await? {
            return Err(AppError::CarNotFound(car_id));
        }
        tracing::info!("Car deleted: {}", car_id);
        Ok(())
    }

    async fn count_cars(&self) -> Result<u64, AppError> {
        self.storage.count(Table::Car).await
    }

    async fn car_detail(&self, car: &Car) -> Result<CarDetail, AppError> {
        let manufacturer: Manufacturer = self
            .storage
            .get_record(Table::Manufacturer, car.manufacturer_id)
            .await?
            .ok_or(AppError::ManufacturerNotFound(car.manufacturer_id))?;

        let mut drivers = Vec::with_capacity(car.driver_ids.len());
        for driver_id in &car.driver_ids {
            let driver: Option<Driver> = self.storage.get_record(Table::Driver, *driver_id).await?;
            match driver {
                Some(driver) => drivers.push(DriverResponse::from(driver)),
                None => tracing::warn!("Car {} references missing driver {}", car.id, driver_id),
            }
        }

        Ok(CarDetail {
            id: car.id,
            model: car.model.clone(),
            manufacturer,
            drivers,
        })
    }

    async fn cars_for_driver(&self, driver_id: u64) -> Result<Vec<Car>, AppError> {
        let cars = self.list_cars().await?;
        Ok(cars.into_iter().filter(|car| car.driver_ids.contains(&driver_id)).collect())
    }

    async fn cars_for_manufacturer(&self, manufacturer_id: u64) -> Result<Vec<Car>, AppError> {
        let cars = self.list_cars().await?;
        Ok(cars
            .into_iter()
            .filter(|car| car.manufacturer_id == manufacturer_id)
            .collect())
    }

    async fn toggle_driver(&self, car_id: u64, driver_id: u64) -> Result<Car, AppError> {
        let mut car = self.require_car(car_id).await?;

        if car.driver_ids.remove(&driver_id) {
            tracing::info!("Driver {} unassigned from car {}", driver_id, car_id);
        } else {
            let driver: Option<Driver> = self.storage.get_record(Table::Driver, driver_id).await?;
            if driver.is_none() {
                return Err(AppError::DriverNotFound(driver_id));
            }
            car.driver_ids.insert(driver_id);
            tracing::info!("Driver {} assigned to car {}", driver_id, car_id);
        }

        self.storage.insert_record(Table::Car, car.id, &car).await?;
        Ok(car)
    }

    async fn remove_driver_everywhere(&self, driver_id: u64) -> Result<usize, AppError> {
        let mut touched = 0;
        for mut car in self.cars_for_driver(driver_id).await? {
            car.driver_ids.remove(&driver_id);
            self.storage.insert_record(Table::Car, car.id, &car).await?;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_for_manufacturer(&self, manufacturer_id: u64) -> Result<usize, AppError> {
        let cars = self.cars_for_manufacturer(manufacturer_id).await?;
        for car in &cars {
            self.storage.delete_record(Table::Car, car.id).await?;
        }
        if !cars.is_empty() {
            tracing::info!("Deleted {} cars of manufacturer {}", cars.len(), manufacturer_id);
        }
        Ok(cars.len())
    }
}
