use chrono::{Datelike, NaiveDateTime, SubsecRound};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::{AppError, Entity, Forbidden};
use crate::models::{Booking, BookingStatus, NewBooking};
use crate::services::access;

/// Files a booking request in WAITING.
///
/// Checks run in a fixed order and the first failure is returned: storable years,
/// time range, item existence, item availability, caller existence, caller is not
/// the owner. Timestamps are stored with second precision, so the range is checked
/// after sub-second truncation.
pub fn create_booking(
    conn: &mut Connection,
    caller_id: i64,
    request: &NewBooking,
) -> Result<Booking, AppError> {
    let start = storable(request.start, "start")?;
    let end = storable(request.end, "end")?;
    if start >= end {
        return Err(AppError::InvalidTimeRange);
    }

    let tx = conn.transaction()?;

    let item = queries::get_item(&tx, request.item_id)?
        .ok_or(AppError::NotFound(Entity::Item, request.item_id))?;
    if !item.available {
        return Err(AppError::ItemUnavailable(item.id));
    }
    if !queries::user_exists(&tx, caller_id)? {
        return Err(AppError::NotFound(Entity::User, caller_id));
    }
    if item.owner_id == caller_id {
        return Err(AppError::Forbidden(Forbidden::OwnerCannotBookOwnItem));
    }

    let id = queries::insert_booking(&tx, item.id, caller_id, &start, &end, BookingStatus::Waiting)?;
    let booking = queries::get_booking_by_id(&tx, id)?
        .ok_or_else(|| AppError::Internal(format!("booking {id} vanished after insert")))?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        item_id = item.id,
        booker_id = caller_id,
        "booking requested"
    );
    Ok(booking)
}

/// Stored timestamps compare as text, which only matches time order for four-digit years.
fn storable(at: NaiveDateTime, field: &str) -> Result<NaiveDateTime, AppError> {
    if !(0..=9999).contains(&at.year()) {
        return Err(AppError::Validation(format!(
            "{field} year must be between 0 and 9999, got {}",
            at.year()
        )));
    }
    Ok(at.trunc_subsecs(0))
}

/// Moves a WAITING booking to APPROVED or REJECTED on behalf of the item owner.
///
/// The whole check-then-write runs inside one IMMEDIATE transaction and the write is
/// a compare-and-set on the status column, so a booking is decided at most once even
/// when several connections race on the same database file.
pub fn approve_or_reject(
    conn: &mut Connection,
    booking_id: i64,
    caller_id: i64,
    approved: bool,
) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if !queries::user_exists(&tx, caller_id)? {
        return Err(AppError::NotFound(Entity::User, caller_id));
    }
    let booking = queries::get_booking_by_id(&tx, booking_id)?
        .ok_or(AppError::NotFound(Entity::Booking, booking_id))?;
    access::ensure_owner(booking.item.owner_id, caller_id)?;

    if booking.status.is_terminal() {
        tracing::warn!(
            booking_id,
            status = booking.status.as_str(),
            "decision on already decided booking"
        );
        return Err(AppError::Conflict {
            booking_id,
            status: booking.status,
        });
    }

    let status = BookingStatus::decided(approved);
    if !queries::decide_if_waiting(&tx, booking_id, status)? {
        let current = queries::get_booking_status(&tx, booking_id)?.unwrap_or(booking.status);
        tracing::warn!(booking_id, status = current.as_str(), "lost decision race");
        return Err(AppError::Conflict {
            booking_id,
            status: current,
        });
    }
    tx.commit()?;

    tracing::info!(booking_id, status = status.as_str(), "booking decided");
    Ok(Booking { status, ..booking })
}

pub fn get_booking(conn: &Connection, booking_id: i64, caller_id: i64) -> Result<Booking, AppError> {
    if !queries::user_exists(conn, caller_id)? {
        return Err(AppError::NotFound(Entity::User, caller_id));
    }
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .ok_or(AppError::NotFound(Entity::Booking, booking_id))?;
    access::ensure_can_view(&booking, caller_id)?;
    Ok(booking)
}
