use super::cache::{CachedEventList, EventCache};
use super::models::{EventSummary, RawEvent};
use super::time::{format_display, parse_event_time, DayWindow};
use super::CalendarService;
use crate::error::{google_calendar_error, DaybookResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Cache-first reader of today's events
pub struct EventFetcher {
    service: Arc<dyn CalendarService>,
    cache: EventCache,
    fallback_timezone: Tz,
}

impl EventFetcher {
    pub fn new(service: Arc<dyn CalendarService>, cache: EventCache, fallback_timezone: Tz) -> Self {
        Self {
            service,
            cache,
            fallback_timezone,
        }
    }

    /// Today's events as a JSON list of `[start, end, summary]` triples
    pub async fn get_today_events(&self) -> DaybookResult<String> {
        self.get_today_events_at(Utc::now()).await
    }

    /// Same as [`get_today_events`](Self::get_today_events) with an explicit clock.
    ///
    /// A fresh cache entry is returned without contacting the service. Service
    /// errors are logged and whatever was collected before the failure is
    /// returned; the cache is only written after a complete fetch.
    pub async fn get_today_events_at(&self, now: DateTime<Utc>) -> DaybookResult<String> {
        if let Some(cached) = self.cache.fresh(now) {
            info!("Using cached data.");
            return Ok(serde_json::to_string(&cached.events)?);
        }

        let mut event_list = Vec::new();
        match self.fetch_into(now, &mut event_list).await {
            Ok(()) => {
                if event_list.is_empty() {
                    info!("No events found for today.");
                }
                let record = CachedEventList::new(now, event_list.clone());
                if let Err(e) = self.cache.store(&record) {
                    warn!("Failed to write event cache: {}", e);
                }
            }
            Err(e) => {
                error!("An error occurred: {}", e);
            }
        }

        Ok(serde_json::to_string(&event_list)?)
    }

    async fn fetch_into(&self, now: DateTime<Utc>, event_list: &mut Vec<EventSummary>) -> DaybookResult<()> {
        let tz = self.calendar_timezone().await?;
        let window = DayWindow::today(now, tz)?;

        info!("Getting today's events");
        let mut events = Vec::new();
        let listed = self.service.list_events(&window, &mut events).await;

        // Whatever arrived before a listing failure is still shown
        for event in &events {
            event_list.push(normalize(event, tz)?);
        }

        listed
    }

    /// Calendar's own timezone, or the configured fallback
    async fn calendar_timezone(&self) -> DaybookResult<Tz> {
        match self.service.calendar_timezone().await? {
            Some(name) => match name.parse::<Tz>() {
                Ok(tz) => Ok(tz),
                Err(_) => {
                    warn!(
                        "Unknown calendar timezone {}, using {}",
                        name, self.fallback_timezone
                    );
                    Ok(self.fallback_timezone)
                }
            },
            None => {
                warn!("Calendar reports no timezone, using {}", self.fallback_timezone);
                Ok(self.fallback_timezone)
            }
        }
    }
}

/// Display triple for a listed event in `tz`; the summary is passed through as-is
pub fn normalize(event: &RawEvent, tz: Tz) -> DaybookResult<EventSummary> {
    let start = event
        .start
        .as_ref()
        .ok_or_else(|| google_calendar_error("Event has no start"))?;
    let end = event
        .end
        .as_ref()
        .ok_or_else(|| google_calendar_error("Event has no end"))?;

    let start = parse_event_time(start, tz)?;
    let end = parse_event_time(end, tz)?;

    Ok(EventSummary(
        format_display(&start, tz),
        format_display(&end, tz),
        event.summary.clone(),
    ))
}
