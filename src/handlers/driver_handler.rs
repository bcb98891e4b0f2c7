// src/handlers/driver_handler.rs
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
    forms::{DriverCreationForm, DriverLicenseUpdateForm, DriverUsernameSearchForm, FormData, SearchForm},
    handlers::{Page, form_context, found, list_context, validated},
    models::driver::{Driver, DriverResponse},
    pagination::Paginator,
    routes,
    services::{CarOperations, DriverOperations},
    state::AppState,
};

fn creation_page(data: &FormData, errors: &[ValidationError]) -> Page {
    Page::new(
        DriverCreationForm::TEMPLATE,
        json!({
            "form": form_context::<DriverCreationForm>(data, &DriverCreationForm::SECRET_FIELDS, errors),
        }),
    )
}

fn update_form_page(data: &FormData, errors: &[ValidationError], object: &Driver) -> Page {
    Page::new(
        DriverLicenseUpdateForm::TEMPLATE,
        json!({
            "form": form_context::<DriverLicenseUpdateForm>(data, &[], errors),
            "object": DriverResponse::from(object),
        }),
    )
}

pub async fn list_drivers(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Query(query): Query<Vec<(String, String)>>,
) -> TaxiResult<Page> {
    let query = FormData::from(query);
    let username = DriverUsernameSearchForm::clean(&query);

    let drivers: Vec<DriverResponse> = state
        .driver_service
        .list_drivers()
        .await?
        .iter()
        .filter(|driver| DriverUsernameSearchForm::matches(&username, &driver.username))
        .map(DriverResponse::from)
        .collect();
    let page = Paginator::new(state.config.page_size).paginate(drivers, query.get("page"))?;

    let search_data = FormData::new().with(DriverUsernameSearchForm::FIELD, username);
    let context = list_context(
        "driver_list",
        &page,
        form_context::<DriverUsernameSearchForm>(&search_data, &[], &[]),
    );
    Ok(Page::new("taxi/driver_list.html", context).for_user(&current))
}

pub async fn driver_detail(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(driver_id): Path<u64>,
) -> TaxiResult<Page> {
    let driver = state.driver_service.require_driver(driver_id).await?;

    let mut cars = Vec::new();
    for car in state.car_service.cars_for_driver(driver.id).await? {
        cars.push(state.car_service.car_detail(&car).await?);
    }

    let context = json!({
        "driver": DriverResponse::from(&driver),
        "cars": cars,
    });
    Ok(Page::new("taxi/driver_detail.html", context).for_user(&current))
}

pub async fn create_page(current: CurrentDriver) -> Page {
    creation_page(&FormData::new(), &[]).for_user(&current)
}

pub async fn create_driver(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let data = FormData::from(form);
    match validated(DriverCreationForm::clean(&data, &*state.driver_service).await)? {
        Ok(creation) => {
            state.driver_service.create_user(creation.into_new_driver()).await?;
            Ok(found(routes::DRIVER_LIST))
        }
        Err(errors) => Ok(creation_page(&data, &errors)
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(driver_id): Path<u64>,
) -> TaxiResult<Page> {
    let driver = state.driver_service.require_driver(driver_id).await?;
    let data = DriverLicenseUpdateForm::initial(&driver);
    Ok(update_form_page(&data, &[], &driver).for_user(&current))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(driver_id): Path<u64>,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let driver = state.driver_service.require_driver(driver_id).await?;
    let data = FormData::from(form);
    match validated(DriverLicenseUpdateForm::clean(&data, &*state.driver_service, driver.id).await)? {
        Ok(update) => {
            state.driver_service.update_driver(driver.id, update).await?;
            Ok(found(routes::DRIVER_LIST))
        }
        Err(errors) => Ok(update_form_page(&data, &errors, &driver)
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(driver_id): Path<u64>,
) -> TaxiResult<Page> {
    let driver = state.driver_service.require_driver(driver_id).await?;
    Ok(Page::new(
        "taxi/driver_confirm_delete.html",
        json!({ "object": DriverResponse::from(&driver) }),
    )
    .for_user(&current))
}

pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    _current: CurrentDriver,
    Path(driver_id): Path<u64>,
) -> TaxiResult<Response> {
    state.driver_service.delete_driver(driver_id).await?;
    Ok(found(routes::DRIVER_LIST))
}
