//! Society CRUD, guarded at the router by the admin-tier access guard.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::dtos::{
    ApiSuccess, CreateSocietyRequest, SocietyView, UpdateSocietyRequest, ValidatedJson,
};
use crate::error::AppError;
use crate::models::{Society, SocietyStatus};
use crate::AppState;

fn society_not_found() -> AppError {
    AppError::NotFound("Society not found".to_string())
}

pub async fn create_society(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateSocietyRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.db.find_society_by_pin(&req.society_pin).await?.is_some() {
        return Err(AppError::Conflict(
            "A society with this pin already exists".to_string(),
        ));
    }

    let now = Utc::now();
    let society = Society {
        id: Uuid::new_v4().to_string(),
        society_name: req.society_name,
        society_pin: req.society_pin,
        address: req.address,
        city: req.city,
        country: req.country,
        latitude: req.latitude,
        longitude: req.longitude,
        status: req.status.unwrap_or(SocietyStatus::Active),
        maintenance_due_date: req.maintenance_due_date,
        notes: req.notes,
        structure: req.structure.into_iter().map(|w| w.into_model()).collect(),
        entry_gates: req.entry_gates.into_iter().map(|g| g.into_model()).collect(),
        exit_gates: req.exit_gates.into_iter().map(|g| g.into_model()).collect(),
        society_admins: vec![],
        engagement: req.engagement.map(|e| e.resolve()),
        created_at: now,
        updated_at: now,
    };

    state.db.insert_society(&society).await?;

    tracing::info!(society_id = %society.id, name = %society.society_name, "Society created");

    Ok((
        StatusCode::CREATED,
        Json(ApiSuccess::new("Society created successfully").with_data(SocietyView::from(&society))),
    ))
}

pub async fn get_all_societies(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let societies = state.db.find_all_societies().await?;
    let views: Vec<SocietyView> = societies.iter().map(SocietyView::from).collect();
    Ok(Json(ApiSuccess::new("Societies fetched").with_data(views)))
}

pub async fn get_society(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let society = state
        .db
        .find_society_by_id(&id)
        .await?
        .ok_or_else(society_not_found)?;
    Ok(Json(
        ApiSuccess::new("Society fetched").with_data(SocietyView::from(&society)),
    ))
}

pub async fn update_society(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSocietyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut society = state
        .db
        .find_society_by_id(&id)
        .await?
        .ok_or_else(society_not_found)?;

    if let Some(pin) = &req.society_pin {
        if *pin != society.society_pin
            && state.db.find_society_by_pin(pin).await?.is_some()
        {
            return Err(AppError::Conflict(
                "A society with this pin already exists".to_string(),
            ));
        }
    }

    if let Some(name) = req.society_name {
        society.society_name = name;
    }
    if let Some(pin) = req.society_pin {
        society.society_pin = pin;
    }
    if let Some(address) = req.address {
        society.address = address;
    }
    if let Some(city) = req.city {
        society.city = city;
    }
    if let Some(country) = req.country {
        society.country = country;
    }
    if let Some(latitude) = req.latitude {
        society.latitude = Some(latitude);
    }
    if let Some(longitude) = req.longitude {
        society.longitude = Some(longitude);
    }
    if let Some(status) = req.status {
        society.status = status;
    }
    if let Some(due_date) = req.maintenance_due_date {
        society.maintenance_due_date = due_date;
    }
    if let Some(notes) = req.notes {
        society.notes = Some(notes);
    }
    if let Some(structure) = req.structure {
        society.structure = structure.into_iter().map(|w| w.into_model()).collect();
    }
    if let Some(gates) = req.entry_gates {
        society.entry_gates = gates.into_iter().map(|g| g.into_model()).collect();
    }
    if let Some(gates) = req.exit_gates {
        society.exit_gates = gates.into_iter().map(|g| g.into_model()).collect();
    }
    if let Some(engagement) = req.engagement {
        society.engagement = Some(engagement.resolve());
    }
    society.updated_at = Utc::now();

    state.db.save_society(&society).await?;

    Ok(Json(
        ApiSuccess::new("Society updated successfully").with_data(SocietyView::from(&society)),
    ))
}

pub async fn toggle_society_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut society = state
        .db
        .find_society_by_id(&id)
        .await?
        .ok_or_else(society_not_found)?;

    society.toggle_status();
    state.db.save_society(&society).await?;

    tracing::info!(society_id = %society.id, status = ?society.status, "Society status toggled");

    Ok(Json(
        ApiSuccess::new("Society status updated").with_data(SocietyView::from(&society)),
    ))
}
