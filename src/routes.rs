// src/routes.rs
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    admin::APP_LABEL,
    handlers::{admin_handler, auth_handler, car_handler, driver_handler, index_handler, manufacturer_handler},
    state::AppState,
};

pub const INDEX: &str = "/";
pub const LOGIN: &str = "/accounts/login/";
pub const LOGOUT: &str = "/accounts/logout/";
pub const MANUFACTURER_LIST: &str = "/manufacturers/";
pub const MANUFACTURER_CREATE: &str = "/manufacturers/create/";
pub const CAR_LIST: &str = "/cars/";
pub const CAR_CREATE: &str = "/cars/create/";
pub const DRIVER_LIST: &str = "/drivers/";
pub const DRIVER_CREATE: &str = "/drivers/create/";
pub const ADMIN_INDEX: &str = "/admin/";

pub fn manufacturer_update(id: u64) -> String {
    format!("/manufacturers/{}/update/", id)
}

pub fn manufacturer_delete(id: u64) -> String {
    format!("/manufacturers/{}/delete/", id)
}

pub fn car_detail(id: u64) -> String {
    format!("/cars/{}/", id)
}

pub fn car_update(id: u64) -> String {
    format!("/cars/{}/update/", id)
}

pub fn car_delete(id: u64) -> String {
    format!("/cars/{}/delete/", id)
}

pub fn car_toggle_assign(id: u64) -> String {
    format!("/cars/{}/toggle-assign/", id)
}

pub fn driver_detail(id: u64) -> String {
    format!("/drivers/{}/", id)
}

pub fn driver_update(id: u64) -> String {
    format!("/drivers/{}/update/", id)
}

pub fn driver_delete(id: u64) -> String {
    format!("/drivers/{}/delete/", id)
}

pub fn admin_changelist(model: &str) -> String {
    format!("/admin/{}/{}/", APP_LABEL, model)
}

pub fn admin_change(model: &str, id: u64) -> String {
    format!("/admin/{}/{}/{}/change/", APP_LABEL, model, id)
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(INDEX, get(index_handler::index))
        .route(LOGIN, get(auth_handler::login_page).post(auth_handler::login))
        .route(LOGOUT, post(auth_handler::logout))
        .route(MANUFACTURER_LIST, get(manufacturer_handler::list_manufacturers))
        .route(
            MANUFACTURER_CREATE,
            get(manufacturer_handler::create_page).post(manufacturer_handler::create_manufacturer),
        )
        .route(
            "/manufacturers/:id/update/",
            get(manufacturer_handler::update_page).post(manufacturer_handler::update_manufacturer),
        )
        .route(
            "/manufacturers/:id/delete/",
            get(manufacturer_handler::delete_page).post(manufacturer_handler::delete_manufacturer),
        )
        .route(CAR_LIST, get(car_handler::list_cars))
        .route(CAR_CREATE, get(car_handler::create_page).post(car_handler::create_car))
        .route("/cars/:id/", get(car_handler::car_detail))
        .route("/cars/:id/update/", get(car_handler::update_page).post(car_handler::update_car))
        .route("/cars/:id/delete/", get(car_handler::delete_page).post(car_handler::delete_car))
        .route("/cars/:id/toggle-assign/", post(car_handler::toggle_assign))
        .route(DRIVER_LIST, get(driver_handler::list_drivers))
        .route(DRIVER_CREATE, get(driver_handler::create_page).post(driver_handler::create_driver))
        .route("/drivers/:id/", get(driver_handler::driver_detail))
        .route(
            "/drivers/:id/update/",
            get(driver_handler::update_page).post(driver_handler::update_driver),
        )
        .route(
            "/drivers/:id/delete/",
            get(driver_handler::delete_page).post(driver_handler::delete_driver),
        )
        .route(ADMIN_INDEX, get(admin_handler::admin_index))
        .route("/admin/taxi/:model/", get(admin_handler::changelist))
        .route("/admin/taxi/:model/:id/change/", get(admin_handler::change_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
