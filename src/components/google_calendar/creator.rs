use super::models::Event;
use super::CalendarService;
use crate::error::DaybookResult;
use tracing::info;

/// Submit `event` to the calendar and return its link. Errors are not retried.
pub async fn add_event(service: &dyn CalendarService, event: &Event) -> DaybookResult<Option<String>> {
    let payload = event.to_payload();
    let link = service.insert_event(&payload).await?;

    info!(
        "Event created: {}",
        link.as_deref().unwrap_or("<no link returned>")
    );

    Ok(link)
}
