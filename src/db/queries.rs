use anyhow::Context;
use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    BookedItem, Booker, Booking, BookingRole, BookingState, BookingStatus, BookingSummary,
    Comment, Item, Page, User,
};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .with_context(|| format!("malformed timestamp in database: {s}"))
}

// ── Users ──

pub fn insert_user(conn: &Connection, name: &str, email: &str) -> anyhow::Result<User> {
    conn.execute(
        "INSERT INTO users (name, email) VALUES (?1, ?2)",
        params![name, email],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        email: email.to_string(),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn user_exists(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn list_users(conn: &Connection) -> anyhow::Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name, email FROM users ORDER BY id ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
        })
    })?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

pub fn update_user(conn: &Connection, user: &User) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET name = ?1, email = ?2 WHERE id = ?3",
        params![user.name, user.email, user.id],
    )?;
    Ok(count > 0)
}

pub fn delete_user(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

/// Whether another user already holds `email`. `except` excludes the user being edited.
pub fn email_taken(conn: &Connection, email: &str, except: Option<i64>) -> anyhow::Result<bool> {
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE lower(email) = lower(?1) AND id != ?2",
        params![email, except.unwrap_or(-1)],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn user_has_history(conn: &Connection, id: i64) -> anyhow::Result<bool> {
    let referenced: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM items WHERE owner_id = ?1)
             OR EXISTS (SELECT 1 FROM bookings WHERE booker_id = ?1)
             OR EXISTS (SELECT 1 FROM comments WHERE author_id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(referenced)
}

// ── Items ──

const ITEM_COLUMNS: &str = "id, name, description, available, owner_id";

fn parse_item_row(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        available: row.get::<_, i32>(3)? != 0,
        owner_id: row.get(4)?,
    })
}

pub fn insert_item(
    conn: &Connection,
    name: &str,
    description: &str,
    available: bool,
    owner_id: i64,
) -> anyhow::Result<Item> {
    conn.execute(
        "INSERT INTO items (name, description, available, owner_id) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, available as i32, owner_id],
    )?;
    Ok(Item {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        description: description.to_string(),
        available,
        owner_id,
    })
}

pub fn get_item(conn: &Connection, id: i64) -> anyhow::Result<Option<Item>> {
    let item = conn
        .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
            params![id],
            parse_item_row,
        )
        .optional()?;
    Ok(item)
}

pub fn update_item(conn: &Connection, item: &Item) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE items SET name = ?1, description = ?2, available = ?3 WHERE id = ?4",
        params![item.name, item.description, item.available as i32, item.id],
    )?;
    Ok(count > 0)
}

pub fn get_items_by_owner(conn: &Connection, owner_id: i64, page: Page) -> anyhow::Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE owner_id = ?1 ORDER BY id ASC LIMIT ?2 OFFSET ?3"
    ))?;
    let rows = stmt.query_map(params![owner_id, page.limit, page.offset], parse_item_row)?;

    let mut items = vec![];
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Available items in id order. Text matching happens in the service layer, where
/// case folding covers non-ASCII names.
pub fn get_available_items(conn: &Connection) -> anyhow::Result<Vec<Item>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE available = 1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], parse_item_row)?;

    let mut items = vec![];
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

// ── Bookings ──

const BOOKING_SELECT: &str = "SELECT b.id, b.start_date, b.end_date, b.status, i.id, i.name, i.owner_id, u.id, u.name
     FROM bookings b
     JOIN items i ON i.id = b.item_id
     JOIN users u ON u.id = b.booker_id";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: i64 = row.get(0)?;
    let start_str: String = row.get(1)?;
    let end_str: String = row.get(2)?;
    let status_str: String = row.get(3)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("unknown booking status in database: {status_str}"))?;

    Ok(Booking {
        id,
        start: parse_datetime(&start_str)?,
        end: parse_datetime(&end_str)?,
        status,
        item: BookedItem {
            id: row.get(4)?,
            name: row.get(5)?,
            owner_id: row.get(6)?,
        },
        booker: Booker {
            id: row.get(7)?,
            name: row.get(8)?,
        },
    })
}

pub fn insert_booking(
    conn: &Connection,
    item_id: i64,
    booker_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    status: BookingStatus,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (item_id, booker_id, start_date, end_date, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item_id,
            booker_id,
            format_datetime(start),
            format_datetime(end),
            status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("{BOOKING_SELECT} WHERE b.id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_status(conn: &Connection, id: i64) -> anyhow::Result<Option<BookingStatus>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM bookings WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match status {
        Some(s) => {
            let parsed = BookingStatus::parse(&s)
                .with_context(|| format!("unknown booking status in database: {s}"))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Compare-and-set: moves a WAITING booking to `status`. Returns false if the
/// booking was not WAITING at the time of the write.
pub fn decide_if_waiting(conn: &Connection, id: i64, status: BookingStatus) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status = 'WAITING'",
        params![status.as_str(), id],
    )?;
    Ok(count > 0)
}

/// Bookings visible to `subject_id` in `role`, filtered by `state` relative to `now`,
/// newest start first, ids ascending within equal starts.
pub fn find_bookings(
    conn: &Connection,
    role: BookingRole,
    subject_id: i64,
    state: BookingState,
    now: &NaiveDateTime,
    page: Page,
) -> anyhow::Result<Vec<Booking>> {
    let now_str = format_datetime(now);
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(subject_id)];

    let scope = match role {
        BookingRole::Owner => "i.owner_id = ?",
        BookingRole::Booker => "b.booker_id = ?",
    };

    let filter = match state {
        BookingState::All => "",
        BookingState::Current => {
            params_vec.push(Box::new(now_str.clone()));
            params_vec.push(Box::new(now_str));
            " AND b.start_date < ? AND b.end_date > ?"
        }
        BookingState::Past => {
            params_vec.push(Box::new(now_str));
            " AND b.end_date <= ?"
        }
        BookingState::Future => {
            params_vec.push(Box::new(now_str));
            " AND b.start_date >= ?"
        }
        BookingState::Waiting => " AND b.status = 'WAITING'",
        BookingState::Rejected => " AND b.status IN ('REJECTED', 'CANCELED')",
    };

    params_vec.push(Box::new(page.limit));
    params_vec.push(Box::new(page.offset));

    let sql = format!(
        "{BOOKING_SELECT} WHERE {scope}{filter} ORDER BY b.start_date DESC, b.id ASC LIMIT ? OFFSET ?"
    );

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_summary_row(row: &rusqlite::Row) -> anyhow::Result<BookingSummary> {
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;
    Ok(BookingSummary {
        id: row.get(0)?,
        booker_id: row.get(1)?,
        start: parse_datetime(&start_str)?,
        end: parse_datetime(&end_str)?,
    })
}

/// Latest approved booking of the item that started before `now`.
pub fn last_approved_booking(
    conn: &Connection,
    item_id: i64,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<BookingSummary>> {
    let result = conn.query_row(
        "SELECT id, booker_id, start_date, end_date FROM bookings
         WHERE item_id = ?1 AND status = 'APPROVED' AND start_date < ?2
         ORDER BY start_date DESC, id ASC LIMIT 1",
        params![item_id, format_datetime(now)],
        |row| Ok(parse_summary_row(row)),
    );

    match result {
        Ok(summary) => Ok(Some(summary?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Earliest approved booking of the item that starts after `now`.
pub fn next_approved_booking(
    conn: &Connection,
    item_id: i64,
    now: &NaiveDateTime,
) -> anyhow::Result<Option<BookingSummary>> {
    let result = conn.query_row(
        "SELECT id, booker_id, start_date, end_date FROM bookings
         WHERE item_id = ?1 AND status = 'APPROVED' AND start_date > ?2
         ORDER BY start_date ASC, id ASC LIMIT 1",
        params![item_id, format_datetime(now)],
        |row| Ok(parse_summary_row(row)),
    );

    match result {
        Ok(summary) => Ok(Some(summary?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Whether `booker_id` has an approved booking of `item_id` that ended before `now`.
pub fn has_completed_booking(
    conn: &Connection,
    booker_id: i64,
    item_id: i64,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let completed: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM bookings
         WHERE booker_id = ?1 AND item_id = ?2 AND status = 'APPROVED' AND end_date < ?3",
        params![booker_id, item_id, format_datetime(now)],
        |row| row.get(0),
    )?;
    Ok(completed)
}

// ── Comments ──

pub fn insert_comment(
    conn: &Connection,
    item_id: i64,
    author: &User,
    text: &str,
    created: &NaiveDateTime,
) -> anyhow::Result<Comment> {
    let created_str = format_datetime(created);
    conn.execute(
        "INSERT INTO comments (text, item_id, author_id, created) VALUES (?1, ?2, ?3, ?4)",
        params![text, item_id, author.id, created_str],
    )?;
    Ok(Comment {
        id: conn.last_insert_rowid(),
        text: text.to_string(),
        item_id,
        author_name: author.name.clone(),
        created: parse_datetime(&created_str)?,
    })
}

pub fn get_comments_for_item(conn: &Connection, item_id: i64) -> anyhow::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.text, c.item_id, u.name, c.created
         FROM comments c JOIN users u ON u.id = c.author_id
         WHERE c.item_id = ?1 ORDER BY c.created ASC, c.id ASC",
    )?;

    let rows = stmt.query_map(params![item_id], |row| {
        let created_str: String = row.get(4)?;
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            created_str,
        ))
    })?;

    let mut comments = vec![];
    for row in rows {
        let (id, text, item_id, author_name, created_str) = row?;
        comments.push(Comment {
            id,
            text,
            item_id,
            author_name,
            created: parse_datetime(&created_str)?,
        });
    }
    Ok(comments)
}
