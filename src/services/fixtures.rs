use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db;
use crate::db::queries;
use crate::models::{Booking, BookingStatus, Item, NewBooking, User};
use crate::services::bookings;

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

pub fn count_bookings(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))
        .unwrap()
}

/// Three users and one available item owned by `owner`.
pub struct Fixture {
    pub owner: User,
    pub booker: User,
    pub stranger: User,
    pub item: Item,
}

pub fn setup() -> (Connection, Fixture) {
    let conn = db::init_db(":memory:").unwrap();
    let owner = queries::insert_user(&conn, "Alice", "alice@example.com").unwrap();
    let booker = queries::insert_user(&conn, "Bob", "bob@example.com").unwrap();
    let stranger = queries::insert_user(&conn, "Carol", "carol@example.com").unwrap();
    let item = Fixture::item(&conn, owner.id, true);
    (
        conn,
        Fixture {
            owner,
            booker,
            stranger,
            item,
        },
    )
}

impl Fixture {
    pub fn item(conn: &Connection, owner_id: i64, available: bool) -> Item {
        queries::insert_item(conn, "Drill", "Cordless power drill", available, owner_id).unwrap()
    }

    pub fn waiting_booking(&self, conn: &mut Connection) -> Booking {
        let request = NewBooking {
            item_id: self.item.id,
            start: dt("2030-01-01 00:00"),
            end: dt("2030-01-08 00:00"),
        };
        bookings::create_booking(conn, self.booker.id, &request).unwrap()
    }

    /// Inserts a booking directly, bypassing the engine, to stage arbitrary history.
    pub fn stage(
        &self,
        conn: &Connection,
        item_id: i64,
        booker_id: i64,
        start: &str,
        end: &str,
        status: BookingStatus,
    ) -> i64 {
        queries::insert_booking(conn, item_id, booker_id, &dt(start), &dt(end), status).unwrap()
    }
}
