use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::caller::CallerId;
use crate::handlers::page_from;
use crate::models::{Booking, BookingRole, NewBooking};
use crate::services::{bookings, temporal};
use crate::state::AppState;

// POST /bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Json(request): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = {
        let mut db = state.db()?;
        bookings::create_booking(&mut db, caller, &request)?
    };
    Ok((StatusCode::CREATED, Json(booking)))
}

// PATCH /bookings/:id?approved=
#[derive(Deserialize)]
pub struct DecisionQuery {
    pub approved: bool,
}

pub async fn decide_booking(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Path(id): Path<i64>,
    Query(query): Query<DecisionQuery>,
) -> Result<Json<Booking>, AppError> {
    let booking = {
        let mut db = state.db()?;
        bookings::approve_or_reject(&mut db, id, caller, query.approved)?
    };
    Ok(Json(booking))
}

// GET /bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let booking = {
        let db = state.db()?;
        bookings::get_booking(&db, id, caller)?
    };
    Ok(Json(booking))
}

// GET /bookings and GET /bookings/owner
#[derive(Deserialize)]
pub struct BookingListQuery {
    pub state: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
}

pub async fn list_booker_bookings(
    State(state): State<Arc<AppState>>,
    caller: CallerId,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    list_bookings(&state, caller, BookingRole::Booker, &query).map(Json)
}

pub async fn list_owner_bookings(
    State(state): State<Arc<AppState>>,
    caller: CallerId,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    list_bookings(&state, caller, BookingRole::Owner, &query).map(Json)
}

fn list_bookings(
    state: &AppState,
    CallerId(caller): CallerId,
    role: BookingRole,
    query: &BookingListQuery,
) -> Result<Vec<Booking>, AppError> {
    let page = page_from(query.from, query.size, &state.config)?;
    let requested = query.state.as_deref().unwrap_or("ALL");
    let now = Utc::now().naive_utc();

    let db = state.db()?;
    temporal::list_bookings(&db, caller, role, requested, &now, page)
}
