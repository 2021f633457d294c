use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, Entity};
use crate::models::{NewUser, User, UserPatch};
use crate::services::require_non_blank;

fn validate_email(email: &str) -> Result<(), AppError> {
    require_non_blank("email", email)?;
    match email.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("invalid email: {email}"))),
    }
}

pub fn create_user(conn: &Connection, new_user: &NewUser) -> Result<User, AppError> {
    require_non_blank("name", &new_user.name)?;
    validate_email(&new_user.email)?;

    let email = new_user.email.trim();
    if queries::email_taken(conn, email, None)? {
        return Err(AppError::DuplicateEmail(email.to_string()));
    }

    let user = queries::insert_user(conn, new_user.name.trim(), email)?;
    tracing::info!(user_id = user.id, "user registered");
    Ok(user)
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User, AppError> {
    queries::get_user(conn, id)?.ok_or(AppError::NotFound(Entity::User, id))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, AppError> {
    Ok(queries::list_users(conn)?)
}

pub fn update_user(conn: &Connection, id: i64, patch: &UserPatch) -> Result<User, AppError> {
    let mut user = get_user(conn, id)?;

    if let Some(name) = &patch.name {
        require_non_blank("name", name)?;
        user.name = name.trim().to_string();
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
        let email = email.trim();
        if queries::email_taken(conn, email, Some(id))? {
            return Err(AppError::DuplicateEmail(email.to_string()));
        }
        user.email = email.to_string();
    }

    queries::update_user(conn, &user)?;
    Ok(user)
}

/// Deleting an unknown user is a no-op. Users referenced by items, bookings or
/// comments are kept so booking history stays intact.
pub fn delete_user(conn: &Connection, id: i64) -> Result<(), AppError> {
    if queries::user_has_history(conn, id)? {
        return Err(AppError::UserInUse(id));
    }
    if queries::delete_user(conn, id)? {
        tracing::info!(user_id = id, "user deleted");
    }
    Ok(())
}
