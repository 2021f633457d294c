pub mod booking;
pub mod comment;
pub mod item;
pub mod page;
pub mod user;

pub use booking::{
    BookedItem, Booker, Booking, BookingRole, BookingState, BookingStatus, NewBooking,
};
pub use comment::{Comment, NewComment};
pub use item::{BookingSummary, Item, ItemDetails, ItemPatch, NewItem};
pub use page::Page;
pub use user::{NewUser, User, UserPatch};
