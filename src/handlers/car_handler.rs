// src/handlers/car_handler.rs
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::CurrentDriver,
    errors::{TaxiResult, ValidationError},
    forms::{CarForm, CarModelSearchForm, FormData, SearchForm},
    handlers::{Page, form_context, found, list_context, validated},
    models::{
        car::{Car, CarDetail},
        driver::DriverResponse,
    },
    pagination::Paginator,
    routes,
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
};

/// Form context plus the manufacturer and driver choices.
async fn form_page(
    state: &AppState,
    data: &FormData,
    errors: &[ValidationError],
    object: Option<&Car>,
) -> TaxiResult<Page> {
    let manufacturers = state.manufacturer_service.list_manufacturers().await?;
    let drivers: Vec<DriverResponse> = state
        .driver_service
        .list_drivers()
        .await?
        .iter()
        .map(DriverResponse::from)
        .collect();

    Ok(Page::new(
        CarForm::TEMPLATE,
        json!({
            "form": form_context::<CarForm>(data, &[], errors),
            "manufacturers": manufacturers,
            "drivers": drivers,
            "object": object,
        }),
    ))
}

pub async fn list_cars(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Query(query): Query<Vec<(String, String)>>,
) -> TaxiResult<Page> {
    let query = FormData::from(query);
    let model = CarModelSearchForm::clean(&query);

    let cars: Vec<Car> = state
        .car_service
        .list_cars()
        .await?
        .into_iter()
        .filter(|car| CarModelSearchForm::matches(&model, &car.model))
        .collect();
    let page = Paginator::new(state.config.page_size).paginate(cars, query.get("page"))?;

    let mut details = Vec::with_capacity(page.object_list.len());
    for car in &page.object_list {
        details.push(state.car_service.car_detail(car).await?);
    }
    let page = page.with_object_list(details);

    let search_data = FormData::new().with(CarModelSearchForm::FIELD, model);
    let context = list_context(
        "car_list",
        &page,
        form_context::<CarModelSearchForm>(&search_data, &[], &[]),
    );
    Ok(Page::new("taxi/car_list.html", context).for_user(&current))
}

pub async fn car_detail(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(car_id): Path<u64>,
) -> TaxiResult<Page> {
    let car = state.car_service.require_car(car_id).await?;
    let detail: CarDetail = state.car_service.car_detail(&car).await?;

    let context = json!({
        "car": detail,
        "is_assigned": car.driver_ids.contains(&current.driver.id),
        "toggle_assign_url": routes::car_toggle_assign(car.id),
    });
    Ok(Page::new("taxi/car_detail.html", context).for_user(&current))
}

pub async fn create_page(State(state): State<Arc<AppState>>, current: CurrentDriver) -> TaxiResult<Page> {
    Ok(form_page(&state, &FormData::new(), &[], None).await?.for_user(&current))
}

pub async fn create_car(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let data = FormData::from(form);
    let cleaned = CarForm::clean(&data, &*state.manufacturer_service, &*state.driver_service).await;
    match validated(cleaned)? {
        Ok(draft) => {
            state.car_service.create_car(draft).await?;
            Ok(found(routes::CAR_LIST))
        }
        Err(errors) => Ok(form_page(&state, &data, &errors, None)
            .await?
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(car_id): Path<u64>,
) -> TaxiResult<Page> {
    let car = state.car_service.require_car(car_id).await?;
    let data = CarForm::initial(&car);
    Ok(form_page(&state, &data, &[], Some(&car)).await?.for_user(&current))
}

pub async fn update_car(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(car_id): Path<u64>,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let car = state.car_service.require_car(car_id).await?;
    let data = FormData::from(form);
    let cleaned = CarForm::clean(&data, &*state.manufacturer_service, &*state.driver_service).await;
    match validated(cleaned)? {
        Ok(draft) => {
            state.car_service.update_car(car.id, draft).await?;
            Ok(found(routes::CAR_LIST))
        }
        Err(errors) => Ok(form_page(&state, &data, &errors, Some(&car))
            .await?
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(car_id): Path<u64>,
) -> TaxiResult<Page> {
    let car = state.car_service.require_car(car_id).await?;
    Ok(Page::new("taxi/car_confirm_delete.html", json!({ "object": car })).for_user(&current))
}

pub async fn delete_car(
    State(state): State<Arc<AppState>>,
    _current: CurrentDriver,
    Path(car_id): Path<u64>,
) -> TaxiResult<Response> {
    state.car_service.delete_car(car_id).await?;
    Ok(found(routes::CAR_LIST))
}

/// Adds the logged-in driver to the car, or removes them if already assigned.
pub async fn toggle_assign(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(car_id): Path<u64>,
) -> TaxiResult<Response> {
    state.car_service.toggle_driver(car_id, current.driver.id).await?;
    Ok(found(routes::car_detail(car_id)))
}
