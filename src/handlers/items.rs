use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::caller::CallerId;
use crate::handlers::page_from;
use crate::models::{Comment, Item, ItemDetails, ItemPatch, NewComment, NewItem};
use crate::services::{comments, items};
use crate::state::AppState;

// POST /items
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Json(new_item): Json<NewItem>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = {
        let db = state.db()?;
        items::create_item(&db, caller, &new_item)?
    };
    Ok((StatusCode::CREATED, Json(item)))
}

// PATCH /items/:id
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Path(id): Path<i64>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<Item>, AppError> {
    let db = state.db()?;
    Ok(Json(items::update_item(&db, id, caller, &patch)?))
}

// GET /items/:id
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Path(id): Path<i64>,
) -> Result<Json<ItemDetails>, AppError> {
    let now = Utc::now().naive_utc();
    let db = state.db()?;
    Ok(Json(items::get_item(&db, id, caller, &now)?))
}

// GET /items
#[derive(Deserialize)]
pub struct ItemListQuery {
    pub from: Option<i64>,
    pub size: Option<i64>,
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<ItemDetails>>, AppError> {
    let page = page_from(query.from, query.size, &state.config)?;
    let now = Utc::now().naive_utc();
    let db = state.db()?;
    Ok(Json(items::list_owner_items(&db, caller, page, &now)?))
}

// GET /items/search?text=
#[derive(Deserialize)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub from: Option<i64>,
    pub size: Option<i64>,
}

pub async fn search_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let page = page_from(query.from, query.size, &state.config)?;
    let text = query.text.as_deref().unwrap_or("");
    let db = state.db()?;
    Ok(Json(items::search_items(&db, text, page)?))
}

// POST /items/:id/comment
pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    CallerId(caller): CallerId,
    Path(id): Path<i64>,
    Json(comment): Json<NewComment>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let now = Utc::now().naive_utc();
    let comment = {
        let db = state.db()?;
        comments::add_comment(&db, id, caller, &comment, &now)?
    };
    Ok((StatusCode::CREATED, Json(comment)))
}
