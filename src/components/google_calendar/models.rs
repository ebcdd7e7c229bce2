use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Event item as returned by the events listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub html_link: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
}

/// Start or end of a listed event; all-day events only carry `date`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

/// One page of the events listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<RawEvent>,
    pub next_page_token: Option<String>,
}

/// The bits of calendar metadata we read
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMetadata {
    pub time_zone: Option<String>,
}

/// Display triple for one of today's events: (start, end, summary)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary(pub String, pub String, pub Option<String>);

/// A new event to be created on the calendar.
///
/// Built once by the caller and never changed afterwards; the builder methods
/// consume the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    summary: String,
    location: String,
    description: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    attendees: Vec<String>,
    time_zone: Option<String>,
}

impl Event {
    pub fn new(
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            summary: summary.into(),
            location: String::new(),
            description: String::new(),
            start,
            end,
            attendees: Vec::new(),
            time_zone: None,
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// Convert into the insert request body
    pub fn to_payload(&self) -> EventPayload {
        EventPayload {
            summary: self.summary.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            start: EventDateTime {
                date_time: self.start.to_rfc3339(),
                time_zone: self.time_zone.clone(),
            },
            end: EventDateTime {
                date_time: self.end.to_rfc3339(),
                time_zone: self.time_zone.clone(),
            },
            attendees: self
                .attendees
                .iter()
                .map(|email| Attendee {
                    email: email.clone(),
                })
                .collect(),
        }
    }
}

/// Wire form of a new event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn payload_nests_times_and_wraps_attendees() {
        let event = Event::new(
            "Test",
            ts("2023-05-28T09:00:00-07:00"),
            ts("2023-05-28T17:00:00-07:00"),
        )
        .attendees(["a@example.com"])
        .time_zone("America/Los_Angeles");

        let value = serde_json::to_value(event.to_payload()).unwrap();

        assert_eq!(value["attendees"], json!([{"email": "a@example.com"}]));
        assert_eq!(
            value["start"],
            json!({"dateTime": "2023-05-28T09:00:00-07:00", "timeZone": "America/Los_Angeles"})
        );
        assert_eq!(
            value["end"],
            json!({"dateTime": "2023-05-28T17:00:00-07:00", "timeZone": "America/Los_Angeles"})
        );
        assert_eq!(value["summary"], "Test");
    }

    #[test]
    fn payload_omits_missing_time_zone() {
        let event = Event::new(
            "No zone",
            ts("2023-05-28T09:00:00Z"),
            ts("2023-05-28T10:00:00Z"),
        );

        let value = serde_json::to_value(event.to_payload()).unwrap();

        assert!(value["start"].get("timeZone").is_none());
        assert_eq!(value["attendees"], json!([]));
    }

    #[test]
    fn summary_triple_serializes_as_array_with_null_title() {
        let titled = EventSummary("09:00 AM".into(), "10:00 AM".into(), Some("Standup".into()));
        let untitled = EventSummary("11:00 AM".into(), "12:00 PM".into(), None);

        let json = serde_json::to_string(&vec![titled, untitled]).unwrap();

        assert_eq!(
            json,
            r#"[["09:00 AM","10:00 AM","Standup"],["11:00 AM","12:00 PM",null]]"#
        );
    }

    #[test]
    fn listing_without_items_deserializes_empty() {
        let page: EventsPage = serde_json::from_str(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
