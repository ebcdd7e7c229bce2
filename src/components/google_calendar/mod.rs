pub mod auth;
pub mod cache;
mod client;
mod creator;
mod fetcher;
pub mod models;
pub mod time;
pub mod token;

pub use cache::{CachedEventList, EventCache};
pub use client::{collect_pages, events_url, GoogleCalendarClient};
pub use creator::add_event;
pub use fetcher::{normalize, EventFetcher};
pub use models::{Event, EventPayload, EventSummary, RawEvent};
pub use time::DayWindow;
pub use token::TokenManager;

use crate::error::DaybookResult;
use async_trait::async_trait;

/// Calendar operations the fetcher and creator depend on
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Timezone identifier from the calendar's metadata
    async fn calendar_timezone(&self) -> DaybookResult<Option<String>>;

    /// Single-instance events inside `window`, ordered by start time, appended
    /// to `sink`. Events received before a failure are left in `sink`.
    async fn list_events(&self, window: &DayWindow, sink: &mut Vec<RawEvent>) -> DaybookResult<()>;

    /// Create an event and return its link
    async fn insert_event(&self, payload: &EventPayload) -> DaybookResult<Option<String>>;
}
