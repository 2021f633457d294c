pub mod access;
pub mod bookings;
pub mod comments;
pub mod items;
pub mod temporal;
pub mod users;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::errors::AppError;

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be blank")));
    }
    Ok(())
}
