// src/handlers/manufacturer_handler.rs
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
    forms::{FormData, ManufacturerForm, ManufacturerNameSearchForm, SearchForm},
    handlers::{Page, form_context, found, list_context, validated},
    models::manufacturer::Manufacturer,
    pagination::Paginator,
    routes,
    services::ManufacturerOperations,
    state::AppState,
};

fn form_page(data: &FormData, errors: &[ValidationError], object: Option<&Manufacturer>) -> Page {
    Page::new(
        ManufacturerForm::TEMPLATE,
        json!({
            "form": form_context::<ManufacturerForm>(data, &[], errors),
            "object": object,
        }),
    )
}

pub async fn list_manufacturers(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Query(query): Query<Vec<(String, String)>>,
) -> TaxiResult<Page> {
    let query = FormData::from(query);
    let name = ManufacturerNameSearchForm::clean(&query);

    let manufacturers: Vec<Manufacturer> = state
        .manufacturer_service
        .list_manufacturers()
        .await?
        .into_iter()
        .filter(|manufacturer| ManufacturerNameSearchForm::matches(&name, &manufacturer.name))
        .collect();
    let page = Paginator::new(state.config.page_size).paginate(manufacturers, query.get("page"))?;

    let search_data = FormData::new().with(ManufacturerNameSearchForm::FIELD, name);
    let context = list_context(
        "manufacturer_list",
        &page,
        form_context::<ManufacturerNameSearchForm>(&search_data, &[], &[]),
    );
    Ok(Page::new("taxi/manufacturer_list.html", context).for_user(&current))
}

pub async fn create_page(current: CurrentDriver) -> Page {
    form_page(&FormData::new(), &[], None).for_user(&current)
}

pub async fn create_manufacturer(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let data = FormData::from(form);
    match validated(ManufacturerForm::clean(&data))? {
        Ok(draft) => {
            state.manufacturer_service.create_manufacturer(draft).await?;
            Ok(found(routes::MANUFACTURER_LIST))
        }
        Err(errors) => Ok(form_page(&data, &errors, None)
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn update_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(manufacturer_id): Path<u64>,
) -> TaxiResult<Page> {
    let manufacturer = state.manufacturer_service.require_manufacturer(manufacturer_id).await?;
    let data = ManufacturerForm::initial(&manufacturer);
    Ok(form_page(&data, &[], Some(&manufacturer)).for_user(&current))
}

pub async fn update_manufacturer(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(manufacturer_id): Path<u64>,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let manufacturer = state.manufacturer_service.require_manufacturer(manufacturer_id).await?;
    let data = FormData::from(form);
    match validated(ManufacturerForm::clean(&data))? {
        Ok(draft) => {
            state
                .manufacturer_service
                .update_manufacturer(manufacturer.id, draft)
                .await?;
            Ok(found(routes::MANUFACTURER_LIST))
        }
        Err(errors) => Ok(form_page(&data, &errors, Some(&manufacturer))
            .status(StatusCode::BAD_REQUEST)
            .for_user(&current)
            .into_response()),
    }
}

pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(manufacturer_id): Path<u64>,
) -> TaxiResult<Page> {
    let manufacturer = state.manufacturer_service.require_manufacturer(manufacturer_id).await?;
    Ok(Page::new(
        "taxi/manufacturer_confirm_delete.html",
        json!({ "object": manufacturer }),
    )
    .for_user(&current))
}

pub async fn delete_manufacturer(
    State(state): State<Arc<AppState>>,
    _current: CurrentDriver,
    Path(manufacturer_id): Path<u64>,
) -> TaxiResult<Response> {
    state.manufacturer_service.delete_manufacturer(manufacturer_id).await?;
    Ok(found(routes::MANUFACTURER_LIST))
}
