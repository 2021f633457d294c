use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::{AppError, Entity};
use crate::models::{Item, ItemDetails, ItemPatch, NewItem, Page};
use crate::services::{access, require_non_blank};

pub fn create_item(conn: &Connection, owner_id: i64, new_item: &NewItem) -> Result<Item, AppError> {
    require_non_blank("name", &new_item.name)?;
    require_non_blank("description", &new_item.description)?;
    if !queries::user_exists(conn, owner_id)? {
        return Err(AppError::NotFound(Entity::User, owner_id));
    }

    let item = queries::insert_item(
        conn,
        new_item.name.trim(),
        new_item.description.trim(),
        new_item.available,
        owner_id,
    )?;
    tracing::info!(item_id = item.id, owner_id, "item listed");
    Ok(item)
}

pub fn update_item(
    conn: &Connection,
    item_id: i64,
    caller_id: i64,
    patch: &ItemPatch,
) -> Result<Item, AppError> {
    let mut item = queries::get_item(conn, item_id)?.ok_or(AppError::NotFound(Entity::Item, item_id))?;
    access::ensure_owner(item.owner_id, caller_id)?;

    if let Some(name) = &patch.name {
        require_non_blank("name", name)?;
        item.name = name.trim().to_string();
    }
    if let Some(description) = &patch.description {
        require_non_blank("description", description)?;
        item.description = description.trim().to_string();
    }
    if let Some(available) = patch.available {
        item.available = available;
    }

    queries::update_item(conn, &item)?;
    Ok(item)
}

/// Item card with comments. Booking neighbours are only filled in for the owner.
pub fn get_item(
    conn: &Connection,
    item_id: i64,
    caller_id: i64,
    now: &NaiveDateTime,
) -> Result<ItemDetails, AppError> {
    let item = queries::get_item(conn, item_id)?.ok_or(AppError::NotFound(Entity::Item, item_id))?;
    details(conn, item, caller_id, now)
}

pub fn list_owner_items(
    conn: &Connection,
    owner_id: i64,
    page: Page,
    now: &NaiveDateTime,
) -> Result<Vec<ItemDetails>, AppError> {
    if !queries::user_exists(conn, owner_id)? {
        return Err(AppError::NotFound(Entity::User, owner_id));
    }
    queries::get_items_by_owner(conn, owner_id, page)?
        .into_iter()
        .map(|item| details(conn, item, owner_id, now))
        .collect()
}

/// Available items whose name or description contains `text`, ignoring case.
pub fn search_items(conn: &Connection, text: &str, page: Page) -> Result<Vec<Item>, AppError> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(vec![]);
    }

    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);
    Ok(queries::get_available_items(conn)?
        .into_iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle)
        })
        .skip(offset)
        .take(limit)
        .collect())
}

fn details(
    conn: &Connection,
    item: Item,
    caller_id: i64,
    now: &NaiveDateTime,
) -> Result<ItemDetails, AppError> {
    let (last_booking, next_booking) = if access::can_decide(item.owner_id, caller_id) {
        (
            queries::last_approved_booking(conn, item.id, now)?,
            queries::next_approved_booking(conn, item.id, now)?,
        )
    } else {
        (None, None)
    };
    let comments = queries::get_comments_for_item(conn, item.id)?;

    Ok(ItemDetails {
        item,
        last_booking,
        next_booking,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Forbidden;
    use crate::models::BookingStatus;
    use crate::services::fixtures::{dt, setup};

    fn new_item(name: &str, description: &str, available: bool) -> NewItem {
        NewItem {
            name: name.to_string(),
            description: description.to_string(),
            available,
        }
    }

    #[test]
    fn test_create_item_requires_known_owner() {
        let (conn, _f) = setup();
        let result = create_item(&conn, 424242, &new_item("Saw", "Hand saw", true));
        assert!(matches!(result, Err(AppError::NotFound(Entity::User, 424242))));
    }

    #[test]
    fn test_create_item_rejects_blank_name() {
        let (conn, f) = setup();
        let result = create_item(&conn, f.owner.id, &new_item("  ", "Hand saw", true));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_only_owner_updates() {
        let (conn, f) = setup();
        let patch = ItemPatch {
            available: Some(false),
            ..Default::default()
        };
        let result = update_item(&conn, f.item.id, f.booker.id, &patch);
        assert!(matches!(result, Err(AppError::Forbidden(Forbidden::NotItemOwner))));

        let updated = update_item(&conn, f.item.id, f.owner.id, &patch).unwrap();
        assert!(!updated.available);
        assert_eq!(updated.name, f.item.name);
    }

    #[test]
    fn test_owner_sees_last_and_next_booking() {
        let (conn, f) = setup();
        let last = f.stage(&conn, f.item.id, f.booker.id, "2030-01-01 00:00", "2030-01-02 00:00", BookingStatus::Approved);
        f.stage(&conn, f.item.id, f.booker.id, "2029-12-01 00:00", "2029-12-02 00:00", BookingStatus::Approved);
        let next = f.stage(&conn, f.item.id, f.booker.id, "2030-03-01 00:00", "2030-03-02 00:00", BookingStatus::Approved);
        f.stage(&conn, f.item.id, f.booker.id, "2030-02-01 00:00", "2030-02-02 00:00", BookingStatus::Rejected);
        let now = dt("2030-01-15 00:00");

        let card = get_item(&conn, f.item.id, f.owner.id, &now).unwrap();
        assert_eq!(card.last_booking.map(|b| b.id), Some(last));
        assert_eq!(card.next_booking.map(|b| b.id), Some(next));

        let card = get_item(&conn, f.item.id, f.booker.id, &now).unwrap();
        assert!(card.last_booking.is_none());
        assert!(card.next_booking.is_none());
    }

    #[test]
    fn test_search_matches_available_items_case_insensitively() {
        let (conn, f) = setup();
        create_item(&conn, f.owner.id, &new_item("Ladder", "Aluminium ladder", true)).unwrap();
        create_item(&conn, f.owner.id, &new_item("Old ladder", "Broken", false)).unwrap();

        let found = search_items(&conn, "LADD", Page::default()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Ladder");

        let by_description = search_items(&conn, "power", Page::default()).unwrap();
        assert_eq!(by_description[0].id, f.item.id);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let (conn, f) = setup();
        let drill = create_item(&conn, f.owner.id, &new_item("Дрель", "Ударная", true)).unwrap();

        let found = search_items(&conn, "дрель", Page::default()).unwrap();
        assert_eq!(found.iter().map(|i| i.id).collect::<Vec<_>>(), vec![drill.id]);

        let found = search_items(&conn, "УДАР", Page::default()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_search_pages_after_matching() {
        let (conn, f) = setup();
        let mut ladders = vec![];
        for n in 0..4 {
            ladders.push(create_item(&conn, f.owner.id, &new_item(&format!("Ladder {n}"), "steps", true)).unwrap().id);
        }
        let found = search_items(&conn, "ladder", Page::new(1, 2).unwrap()).unwrap();
        assert_eq!(found.iter().map(|i| i.id).collect::<Vec<_>>(), ladders[1..3].to_vec());
    }

    #[test]
    fn test_blank_search_is_empty() {
        let (conn, _f) = setup();
        assert!(search_items(&conn, "   ", Page::default()).unwrap().is_empty());
    }

    #[test]
    fn test_list_owner_items_paged() {
        let (conn, f) = setup();
        for n in 0..3 {
            create_item(&conn, f.owner.id, &new_item(&format!("Tool {n}"), "tool", true)).unwrap();
        }
        let page = Page::new(1, 2).unwrap();
        let items = list_owner_items(&conn, f.owner.id, page, &dt("2030-01-01 00:00")).unwrap();
        let names: Vec<_> = items.iter().map(|d| d.item.name.as_str()).collect();
        assert_eq!(names, vec!["Tool 0", "Tool 1"]);
    }
}
