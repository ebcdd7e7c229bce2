use super::models::EventTime;
use crate::error::{google_calendar_error, DaybookResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 12-hour clock with AM/PM, e.g. `09:00 AM`
pub const DISPLAY_FORMAT: &str = "%I:%M %p";

/// Half-open `[start, end)` window covering one calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct DayWindow {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub time_zone: Tz,
}

impl DayWindow {
    /// Window for the day `now` falls on in `tz`
    pub fn today(now: DateTime<Utc>, tz: Tz) -> DaybookResult<Self> {
        let today = now.with_timezone(&tz).date_naive();
        let tomorrow = today
            .succ_opt()
            .ok_or_else(|| google_calendar_error("Date out of range"))?;

        Ok(Self {
            start: start_of_day(tz, today)?,
            end: start_of_day(tz, tomorrow)?,
            time_zone: tz,
        })
    }

    pub fn time_min(&self) -> String {
        self.start.to_rfc3339()
    }

    pub fn time_max(&self) -> String {
        self.end.to_rfc3339()
    }
}

/// First instant of `date` in `tz`. Midnight can fall in a DST gap, in which
/// case the first valid minute after it is used.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DaybookResult<DateTime<Tz>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| google_calendar_error("Failed to create datetime"))?;

    (0..=180)
        .map(|minutes| midnight + Duration::minutes(minutes))
        .find_map(|candidate| resolve_local(tz, &candidate))
        .ok_or_else(|| google_calendar_error(&format!("No valid start of day for {}", date)))
}

fn resolve_local(tz: Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(naive).earliest()
}

/// Resolve a listed event time, falling back to the all-day `date` field
pub fn parse_event_time(time: &EventTime, tz: Tz) -> DaybookResult<DateTime<Tz>> {
    if let Some(date_time) = &time.date_time {
        let parsed = DateTime::parse_from_rfc3339(date_time).map_err(|e| {
            google_calendar_error(&format!("Failed to parse datetime {}: {}", date_time, e))
        })?;
        Ok(parsed.with_timezone(&tz))
    } else if let Some(date) = &time.date {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| google_calendar_error(&format!("Failed to parse date {}: {}", date, e)))?;
        start_of_day(tz, date)
    } else {
        Err(google_calendar_error("Event time has neither dateTime nor date"))
    }
}

/// Format an instant as 12-hour local time in `tz`
pub fn format_display<T: TimeZone>(time: &DateTime<T>, tz: Tz) -> String {
    time.with_timezone(&tz).format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;
    use chrono_tz::America::Sao_Paulo;

    fn timed(s: &str) -> EventTime {
        EventTime {
            date_time: Some(s.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn offset_timestamp_displays_in_calendar_zone() {
        let start = parse_event_time(&timed("2023-05-28T09:00:00-07:00"), Los_Angeles).unwrap();
        assert_eq!(format_display(&start, Los_Angeles), "09:00 AM");

        let end = parse_event_time(&timed("2023-05-28T17:00:00-07:00"), Los_Angeles).unwrap();
        assert_eq!(format_display(&end, Los_Angeles), "05:00 PM");
    }

    #[test]
    fn utc_timestamp_is_converted() {
        let start = parse_event_time(&timed("2023-05-28T16:30:00Z"), Los_Angeles).unwrap();
        assert_eq!(format_display(&start, Los_Angeles), "09:30 AM");
    }

    #[test]
    fn all_day_event_falls_back_to_date() {
        let time = EventTime {
            date: Some("2023-05-28".to_string()),
            ..Default::default()
        };
        let start = parse_event_time(&time, Los_Angeles).unwrap();
        assert_eq!(format_display(&start, Los_Angeles), "12:00 AM");
        assert_eq!(start.date_naive(), NaiveDate::from_ymd_opt(2023, 5, 28).unwrap());
    }

    #[test]
    fn malformed_or_empty_times_are_errors() {
        assert!(parse_event_time(&timed("yesterday at noon"), Los_Angeles).is_err());
        assert!(parse_event_time(&EventTime::default(), Los_Angeles).is_err());
    }

    #[test]
    fn window_spans_local_day() {
        // 2023-05-28 03:00 UTC is still the 27th in Los Angeles
        let now = Utc.with_ymd_and_hms(2023, 5, 28, 3, 0, 0).unwrap();
        let window = DayWindow::today(now, Los_Angeles).unwrap();

        assert_eq!(window.time_min(), "2023-05-27T00:00:00-07:00");
        assert_eq!(window.time_max(), "2023-05-28T00:00:00-07:00");
        assert_eq!(window.time_zone, Los_Angeles);
    }

    #[test]
    fn window_start_skips_dst_gap_at_midnight() {
        // Sao Paulo moved clocks from 00:00 to 01:00 on 2018-11-04
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        let start = start_of_day(Sao_Paulo, date).unwrap();
        assert_eq!(start.format("%H:%M").to_string(), "01:00");
    }
}
