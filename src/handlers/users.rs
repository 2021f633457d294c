use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::errors::AppError;
use crate::models::{NewUser, User, UserPatch};
use crate::services::users;
use crate::state::AppState;

// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = {
        let db = state.db()?;
        users::create_user(&db, &new_user)?
    };
    Ok((StatusCode::CREATED, Json(user)))
}

// GET /users
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, AppError> {
    let db = state.db()?;
    Ok(Json(users::list_users(&db)?))
}

// GET /users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    let db = state.db()?;
    Ok(Json(users::get_user(&db, id)?))
}

// PATCH /users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, AppError> {
    let db = state.db()?;
    Ok(Json(users::update_user(&db, id, &patch)?))
}

// DELETE /users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let db = state.db()?;
    users::delete_user(&db, id)?;
    Ok(StatusCode::NO_CONTENT)
}
