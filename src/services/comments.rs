use chrono::{NaiveDateTime, SubsecRound};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, Entity};
use crate::models::{Comment, NewComment};
use crate::services::require_non_blank;

/// Only a booker whose approved booking of the item has already ended may comment.
pub fn add_comment(
    conn: &Connection,
    item_id: i64,
    author_id: i64,
    comment: &NewComment,
    now: &NaiveDateTime,
) -> Result<Comment, AppError> {
    require_non_blank("text", &comment.text)?;

    let author = queries::get_user(conn, author_id)?.ok_or(AppError::NotFound(Entity::User, author_id))?;
    if queries::get_item(conn, item_id)?.is_none() {
        return Err(AppError::NotFound(Entity::Item, item_id));
    }
    if !queries::has_completed_booking(conn, author_id, item_id, now)? {
        return Err(AppError::CommentNotAllowed);
    }

    let created = (*now).trunc_subsecs(0);
    let comment = queries::insert_comment(conn, item_id, &author, comment.text.trim(), &created)?;
    tracing::info!(comment_id = comment.id, item_id, author_id, "comment added");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use crate::services::fixtures::{dt, setup};

    fn text(s: &str) -> NewComment {
        NewComment {
            text: s.to_string(),
        }
    }

    #[test]
    fn test_comment_after_completed_booking() {
        let (conn, f) = setup();
        f.stage(&conn, f.item.id, f.booker.id, "2030-01-01 00:00", "2030-01-08 00:00", BookingStatus::Approved);

        let comment = add_comment(&conn, f.item.id, f.booker.id, &text("Worked great"), &dt("2030-02-01 00:00")).unwrap();
        assert_eq!(comment.author_name, "Bob");
        assert_eq!(comment.text, "Worked great");
        assert_eq!(comment.created, dt("2030-02-01 00:00"));

        let stored = queries::get_comments_for_item(&conn, f.item.id).unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn test_comment_before_booking_ends_refused() {
        let (conn, f) = setup();
        f.stage(&conn, f.item.id, f.booker.id, "2030-01-01 00:00", "2030-01-08 00:00", BookingStatus::Approved);
        let result = add_comment(&conn, f.item.id, f.booker.id, &text("Too soon"), &dt("2030-01-05 00:00"));
        assert!(matches!(result, Err(AppError::CommentNotAllowed)));
    }

    #[test]
    fn test_comment_on_rejected_booking_refused() {
        let (conn, f) = setup();
        f.stage(&conn, f.item.id, f.booker.id, "2030-01-01 00:00", "2030-01-08 00:00", BookingStatus::Rejected);
        let result = add_comment(&conn, f.item.id, f.booker.id, &text("Never used it"), &dt("2030-02-01 00:00"));
        assert!(matches!(result, Err(AppError::CommentNotAllowed)));
    }

    #[test]
    fn test_blank_comment_refused() {
        let (conn, f) = setup();
        let result = add_comment(&conn, f.item.id, f.booker.id, &text(" "), &dt("2030-02-01 00:00"));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_comment_on_missing_item() {
        let (conn, f) = setup();
        let result = add_comment(&conn, 999, f.booker.id, &text("Hi"), &dt("2030-02-01 00:00"));
        assert!(matches!(result, Err(AppError::NotFound(Entity::Item, 999))));
    }
}
