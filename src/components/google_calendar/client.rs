use super::models::{CalendarMetadata, EventPayload, EventsPage, RawEvent};
use super::time::DayWindow;
use super::token::TokenManager;
use super::CalendarService;
use crate::error::{google_calendar_error, DaybookResult};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;
use url::Url;

/// Google Calendar v3 REST root
pub const API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Live calendar service talking to Google over HTTPS
#[derive(Clone)]
pub struct GoogleCalendarClient {
    calendar_id: String,
    token_manager: TokenManager,
    client: Client,
}

impl GoogleCalendarClient {
    pub fn new(calendar_id: impl Into<String>, token_manager: TokenManager) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            token_manager,
            client: Client::new(),
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> DaybookResult<T> {
        let access_token = self.token_manager.get_access_token().await?;

        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", what, e)))?;

        parse_response(response, what).await
    }
}

/// URL for `calendars/{id}` followed by `segments`
fn calendar_url(calendar_id: &str, segments: &[&str]) -> DaybookResult<Url> {
    let mut url = Url::parse(API_BASE)
        .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| google_calendar_error("API base URL cannot have segments"))?
        .push("calendars")
        .push(calendar_id)
        .extend(segments);
    Ok(url)
}

/// Events listing URL for one page of `window`, recurring events expanded
pub fn events_url(
    calendar_id: &str,
    window: &DayWindow,
    page_token: Option<&str>,
) -> DaybookResult<Url> {
    let mut url = calendar_url(calendar_id, &["events"])?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("timeMin", &window.time_min())
            .append_pair("timeMax", &window.time_max())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime")
            .append_pair("timeZone", window.time_zone.name());
        if let Some(token) = page_token {
            query.append_pair("pageToken", token);
        }
    }
    Ok(url)
}

/// Request pages until one comes back without `nextPageToken`, appending
/// items to `sink` as they arrive. Pages received before a failure stay in
/// `sink`.
pub async fn collect_pages<F, Fut>(sink: &mut Vec<RawEvent>, mut fetch_page: F) -> DaybookResult<()>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = DaybookResult<EventsPage>>,
{
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch_page(page_token.take()).await?;
        debug!("Fetched page with {} events", page.items.len());
        sink.extend(page.items);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => return Ok(()),
        }
    }
}

async fn parse_response<T: DeserializeOwned>(response: Response, what: &str) -> DaybookResult<T> {
    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(google_calendar_error(&format!(
            "Failed to {}: HTTP {} - {}",
            what, status, error_body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| google_calendar_error(&format!("Failed to parse response to {}: {}", what, e)))
}

#[async_trait]
impl CalendarService for GoogleCalendarClient {
    async fn calendar_timezone(&self) -> DaybookResult<Option<String>> {
        let url = calendar_url(&self.calendar_id, &[])?;
        let metadata: CalendarMetadata = self
            .send(self.client.get(url), "fetch calendar metadata")
            .await?;
        Ok(metadata.time_zone)
    }

    async fn list_events(&self, window: &DayWindow, sink: &mut Vec<RawEvent>) -> DaybookResult<()> {
        collect_pages(sink, |page_token| async move {
            let url = events_url(&self.calendar_id, window, page_token.as_deref())?;
            self.send(self.client.get(url), "fetch events").await
        })
        .await
    }

    async fn insert_event(&self, payload: &EventPayload) -> DaybookResult<Option<String>> {
        let url = calendar_url(&self.calendar_id, &["events"])?;
        let created: RawEvent = self
            .send(self.client.post(url).json(payload), "create event")
            .await?;
        Ok(created.html_link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::Los_Angeles;

    fn window() -> DayWindow {
        let now = Utc.with_ymd_and_hms(2023, 5, 28, 19, 0, 0).unwrap();
        DayWindow::today(now, Los_Angeles).unwrap()
    }

    fn pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().into_owned().collect()
    }

    fn page(ids: &[&str], next: Option<&str>) -> EventsPage {
        EventsPage {
            items: ids
                .iter()
                .map(|id| RawEvent {
                    id: Some(id.to_string()),
                    ..Default::default()
                })
                .collect(),
            next_page_token: next.map(str::to_string),
        }
    }

    fn ids(events: &[RawEvent]) -> Vec<&str> {
        events.iter().filter_map(|e| e.id.as_deref()).collect()
    }

    #[test]
    fn events_url_queries_single_instances_of_the_day() {
        let url = events_url("primary", &window(), None).unwrap();

        assert_eq!(url.path(), "/calendar/v3/calendars/primary/events");
        assert_eq!(
            pairs(&url),
            vec![
                ("timeMin".to_string(), "2023-05-28T00:00:00-07:00".to_string()),
                ("timeMax".to_string(), "2023-05-29T00:00:00-07:00".to_string()),
                ("singleEvents".to_string(), "true".to_string()),
                ("orderBy".to_string(), "startTime".to_string()),
                ("timeZone".to_string(), "America/Los_Angeles".to_string()),
            ]
        );
    }

    #[test]
    fn events_url_carries_page_token_and_calendar_id() {
        let url = events_url("team@group.calendar.google.com", &window(), Some("CiAK")).unwrap();

        assert!(pairs(&url).contains(&("pageToken".to_string(), "CiAK".to_string())));
        assert_eq!(
            url.path_segments().unwrap().nth(3),
            Some("team@group.calendar.google.com")
        );
    }

    #[tokio::test]
    async fn pages_are_merged_until_no_token() {
        let mut pages = vec![page(&["a", "b"], Some("p2")), page(&["c"], None)].into_iter();
        let mut requested = Vec::new();
        let mut events = Vec::new();

        collect_pages(&mut events, |token| {
            requested.push(token);
            let next = pages.next();
            async move { next.ok_or_else(|| google_calendar_error("no more pages")) }
        })
        .await
        .unwrap();

        assert_eq!(ids(&events), vec!["a", "b", "c"]);
        assert_eq!(requested, vec![None, Some("p2".to_string())]);
    }

    #[tokio::test]
    async fn failed_later_page_keeps_earlier_items() {
        let mut calls = 0;
        let mut events = Vec::new();

        let result = collect_pages(&mut events, |_token| {
            calls += 1;
            let response = if calls == 1 {
                Ok(page(&["a"], Some("p2")))
            } else {
                Err(google_calendar_error("HTTP 500 - backend error"))
            };
            async move { response }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(ids(&events), vec!["a"]);
        assert_eq!(calls, 2);
    }
}
