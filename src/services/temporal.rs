use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, Entity};
use crate::models::{Booking, BookingRole, BookingState, Page};

/// Lists bookings for `subject_id` seen from `role`, filtered into the bucket named by
/// `state` relative to `now`.
///
/// The subject is looked up before `state` is parsed, so an unknown user is reported
/// as not found even when the state is also invalid. Buckets:
///
/// - `CURRENT`: `start < now < end`
/// - `PAST`: `end <= now`
/// - `FUTURE`: `start >= now`
///
/// A booking that starts or ends exactly at `now` lands in FUTURE or PAST, never
/// CURRENT, so the three time buckets partition ALL.
/// - `WAITING`: status WAITING
/// - `REJECTED`: status REJECTED or CANCELED
///
/// Results are ordered by start descending, then id ascending, and the page window is
/// applied after filtering.
pub fn list_bookings(
    conn: &Connection,
    subject_id: i64,
    role: BookingRole,
    state: &str,
    now: &NaiveDateTime,
    page: Page,
) -> Result<Vec<Booking>, AppError> {
    if !queries::user_exists(conn, subject_id)? {
        return Err(AppError::NotFound(Entity::User, subject_id));
    }
    let state: BookingState = state.parse()?;

    let bookings = queries::find_bookings(conn, role, subject_id, state, now, page)?;
    tracing::debug!(
        subject_id,
        ?role,
        state = state.as_str(),
        count = bookings.len(),
        "resolved booking list"
    );
    Ok(bookings)
}
