use crate::errors::{AppError, Forbidden};
use crate::models::Booking;

/// The booker and the owner of the booked item may read a booking.
pub fn can_view(booking: &Booking, caller_id: i64) -> bool {
    booking.booker.id == caller_id || booking.item.owner_id == caller_id
}

/// Only the item owner may decide bookings of the item or edit it.
pub fn can_decide(item_owner_id: i64, caller_id: i64) -> bool {
    item_owner_id == caller_id
}

pub fn ensure_can_view(booking: &Booking, caller_id: i64) -> Result<(), AppError> {
    if can_view(booking, caller_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(Forbidden::NotBookerOrOwner))
    }
}

pub fn ensure_owner(item_owner_id: i64, caller_id: i64) -> Result<(), AppError> {
    if can_decide(item_owner_id, caller_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(Forbidden::NotItemOwner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use crate::models::{BookedItem, Booker, BookingStatus};

    fn booking(owner_id: i64, booker_id: i64) -> Booking {
        let dt = |s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap();
        Booking {
            id: 1,
            start: dt("2030-01-01 00:00:00"),
            end: dt("2030-01-08 00:00:00"),
            status: BookingStatus::Waiting,
            item: BookedItem {
                id: 10,
                name: "Ladder".to_string(),
                owner_id,
            },
            booker: Booker {
                id: booker_id,
                name: "Bob".to_string(),
            },
        }
    }

    #[test]
    fn test_booker_and_owner_can_view() {
        let b = booking(1, 2);
        assert!(can_view(&b, 1));
        assert!(can_view(&b, 2));
    }

    #[test]
    fn test_stranger_cannot_view() {
        let b = booking(1, 2);
        assert!(!can_view(&b, 3));
        assert!(matches!(
            ensure_can_view(&b, 3),
            Err(AppError::Forbidden(Forbidden::NotBookerOrOwner))
        ));
    }

    #[test]
    fn test_only_owner_can_decide() {
        assert!(can_decide(1, 1));
        assert!(!can_decide(1, 2));
        assert!(matches!(
            ensure_owner(1, 2),
            Err(AppError::Forbidden(Forbidden::NotItemOwner))
        ));
    }
}
