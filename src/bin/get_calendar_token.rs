use daybook::components::FileStore;
use daybook::startup;
use std::sync::Arc;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;

    // Store the token where daybook looks for it
    let store = Arc::new(FileStore::new(&config.data_dir));
    let token_manager = startup::token_manager(&config, store.clone());

    println!("Opening browser for Google Calendar authorization...");
    let token = token_manager.authorize().await?;

    info!("Token expires at {}", token.expires_at);
    println!(
        "Token successfully saved to {}!",
        store.path_for(&config.token_file).display()
    );

    Ok(())
}
