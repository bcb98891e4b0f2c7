// src/services/mod.rs
pub mod car_service;
pub mod driver_service;
pub mod manufacturer_service;
pub mod session_service;
pub mod storage_service;

pub use car_service::{CarOperations, CarService};
pub use driver_service::{DriverOperations, DriverService};
pub use manufacturer_service::{ManufacturerOperations, ManufacturerService};
pub use session_service::{SessionOperations, SessionService};
pub use storage_service::{StorageService, StoreConfig};
