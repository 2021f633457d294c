pub mod bookings;
pub mod caller;
pub mod health;
pub mod items;
pub mod users;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::Page;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/users",
            post(users::create_user).get(users::list_users),
        )
        .route(
            "/users/:id",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/items", post(items::create_item).get(items::list_items))
        .route("/items/search", get(items::search_items))
        .route(
            "/items/:id",
            get(items::get_item).patch(items::update_item),
        )
        .route("/items/:id/comment", post(items::add_comment))
        .route(
            "/bookings",
            post(bookings::create_booking).get(bookings::list_booker_bookings),
        )
        .route("/bookings/owner", get(bookings::list_owner_bookings))
        .route(
            "/bookings/:id",
            get(bookings::get_booking).patch(bookings::decide_booking),
        )
        .with_state(state)
}

/// `from` defaults to 0 and `size` to the configured page size, capped at the maximum.
pub(crate) fn page_from(from: Option<i64>, size: Option<i64>, config: &AppConfig) -> Result<Page, AppError> {
    let page = Page::new(from.unwrap_or(0), size.unwrap_or(config.default_page_size))?;
    Ok(page.capped(config.max_page_size))
}
