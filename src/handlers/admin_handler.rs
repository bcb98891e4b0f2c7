// src/handlers/admin_handler.rs
use axum::extract::{Path, Query, State};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::{
    admin::{self, ModelAdmin},
    auth::StaffDriver,
    errors::{TaxiError, TaxiResult},
    forms::FormData,
    handlers::Page,
    pagination::Paginator,
    routes,
    services::{CarOperations, DriverOperations, ManufacturerOperations},
    state::AppState,
};

fn model_admin<'a>(state: &'a AppState, model: &str) -> TaxiResult<&'a ModelAdmin> {
    state
        .admin_site
        .get(model)
        .ok_or_else(|| TaxiError::not_found(format!("No admin registered for {}", model)))
}

/// Flat records of every object of `admin`'s model, in id order.
async fn records(state: &AppState, admin: &ModelAdmin) -> TaxiResult<Vec<Map<String, Value>>> {
    let records: Vec<Map<String, Value>> = match admin.model {
        "driver" => state
            .driver_service
            .list_drivers()
            .await?
            .iter()
            .map(admin::driver_record)
            .collect(),
        "manufacturer" => state
            .manufacturer_service
            .list_manufacturers()
            .await?
            .iter()
            .map(admin::manufacturer_record)
            .collect(),
        "car" => {
            let mut records = Vec::new();
            for car in state.car_service.list_cars().await? {
                records.push(admin::car_record(&state.car_service.car_detail(&car).await?));
            }
            records
        }
        other => return Err(TaxiError::not_found(format!("No admin registered for {}", other))),
    };
    Ok(records)
}

async fn record(state: &AppState, admin: &ModelAdmin, id: u64) -> TaxiResult<Map<String, Value>> {
    match admin.model {
        "driver" => Ok(admin::driver_record(&state.driver_service.require_driver(id).await?)),
        "manufacturer" => Ok(admin::manufacturer_record(
            &state.manufacturer_service.require_manufacturer(id).await?,
        )),
        "car" => {
            let car = state.car_service.require_car(id).await?;
            Ok(admin::car_record(&state.car_service.car_detail(&car).await?))
        }
        other => Err(TaxiError::not_found(format!("No admin registered for {}", other))),
    }
}

pub async fn admin_index(State(state): State<Arc<AppState>>, StaffDriver(current): StaffDriver) -> Page {
    let models: Vec<Value> = state
        .admin_site
        .models()
        .iter()
        .map(|admin| {
            json!({
                "model": admin.model,
                "name": admin.verbose_name_plural,
                "url": routes::admin_changelist(admin.model),
            })
        })
        .collect();

    Page::new("admin/index.html", json!({ "app_label": admin::APP_LABEL, "models": models })).for_user(&current)
}

pub async fn changelist(
    State(state): State<Arc<AppState>>,
    StaffDriver(current): StaffDriver,
    Path(model): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> TaxiResult<Page> {
    let admin = model_admin(&state, &model)?;
    let query = FormData::from(query);
    let search = query.value("q");
    let filters: Vec<(&str, &str)> = admin
        .list_filter
        .iter()
        .filter_map(|name| query.get(name).map(|value| (*name, value)))
        .collect();

    let matching: Vec<Map<String, Value>> = records(&state, admin)
        .await?
        .into_iter()
        .filter(|record| admin.matches_search(record, &search) && admin.matches_filters(record, &filters))
        .collect();
    let page = Paginator::new(state.config.page_size).paginate(matching, query.get("page"))?;

    let rows: Vec<Value> = page
        .object_list
        .iter()
        .map(|record| {
            let id = record.get("id").and_then(Value::as_u64).unwrap_or_default();
            json!({
                "id": id,
                "url": routes::admin_change(admin.model, id),
                "cells": admin.row(record),
            })
        })
        .collect();

    let context = json!({
        "model_admin": admin,
        "columns": admin.list_display,
        "rows": rows,
        "search": search,
        "is_paginated": page.is_paginated,
        "page_obj": page.page_obj,
    });
    Ok(Page::new("admin/change_list.html", context).for_user(&current))
}

pub async fn change_page(
    State(state): State<Arc<AppState>>,
    StaffDriver(current): StaffDriver,
    Path((model, id)): Path<(String, u64)>,
) -> TaxiResult<Page> {
    let admin = model_admin(&state, &model)?;
    let record = record(&state, admin, id).await?;

    let context = json!({
        "model_admin": admin,
        "original": record.get("display"),
        "fieldsets": admin.fieldset_values(&record),
    });
    Ok(Page::new("admin/change_form.html", context).for_user(&current))
}
