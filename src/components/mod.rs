pub mod google_calendar;
pub mod storage;

pub use google_calendar::{EventFetcher, GoogleCalendarClient};
pub use storage::{FileStore, MemoryStore, Store};
