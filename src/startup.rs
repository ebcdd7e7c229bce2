use crate::components::google_calendar::auth::OAuthClient;
use crate::components::google_calendar::{EventCache, GoogleCalendarClient, TokenManager};
use crate::components::{EventFetcher, FileStore, Store};
use crate::config::Config;
use crate::error::Error;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Token manager backed by the configured data directory
pub fn token_manager(config: &Config, store: Arc<dyn Store>) -> TokenManager {
    let oauth = OAuthClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.oauth_redirect_port,
    );
    TokenManager::new(oauth, store, config.token_file.clone())
}

/// Wire up the live client and the cached fetcher
pub fn build_services(
    config: &Config,
) -> miette::Result<(Arc<GoogleCalendarClient>, EventFetcher)> {
    let store: Arc<dyn Store> = Arc::new(FileStore::new(&config.data_dir));
    info!("Using data directory {}", config.data_dir.display());

    let client = Arc::new(GoogleCalendarClient::new(
        config.google_calendar_id.clone(),
        token_manager(config, Arc::clone(&store)),
    ));

    let cache = EventCache::new(store, config.cache_file.clone(), config.cache_duration()?);
    let fetcher = EventFetcher::new(client.clone(), cache, config.fallback_timezone()?);

    Ok((client, fetcher))
}
