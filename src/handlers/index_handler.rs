// src/handlers/index_handler.rs
use axum::extract::State;
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::CurrentDriver,
    errors::TaxiResult,
    handlers::Page,
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
};

pub async fn index(State(state): State<Arc<AppState>>, current: CurrentDriver) -> TaxiResult<Page> {
    let num_drivers = state.driver_service.count_drivers().await?;
    let num_cars = state.car_service.count_cars().await?;
    let num_manufacturers = state.manufacturer_service.count_manufacturers().await?;

    let context = json!({
        "num_drivers": num_drivers,
        "num_cars": num_cars,
        "num_manufacturers": num_manufacturers,
        "num_visits": current.session.num_visits,
    });
    Ok(Page::new("taxi/index.html", context).for_user(&current))
}
