use chrono::DateTime;
use daybook::components::google_calendar::{add_event, Event};
use daybook::error::{Error, DaybookResult};
use daybook::startup;
use tracing::info;

/// Illustrative event submitted on every run
fn sample_event() -> DaybookResult<Event> {
    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::Other(format!("Invalid sample timestamp {}: {}", s, e)))
    };

    Ok(Event::new(
        "Google I/O 2015",
        parse("2023-05-28T09:00:00-07:00")?,
        parse("2023-05-28T17:00:00-07:00")?,
    )
    .location("800 Howard St., San Francisco, CA 94103")
    .description("A chance to hear more about Google's developer products.")
    .attendees(["lpage@example.com", "sbrin@example.com"])
    .time_zone("America/Los_Angeles"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting daybook v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = startup::load_config()?;
    let (client, fetcher) = startup::build_services(&config)?;

    let events = fetcher.get_today_events().await?;
    println!("{}", events);

    let link = add_event(&*client, &sample_event()?).await?;
    println!(
        "Event created: {}",
        link.as_deref().unwrap_or("<no link returned>")
    );

    Ok(())
}
