use super::token::{Token, TokenResponse, TOKEN_URL};
use crate::error::{auth_error, DaybookResult};
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

/// Google OAuth authorization endpoint
pub const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Read and write access to calendars and events
pub const SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Installed-app OAuth client registration
#[derive(Debug, Clone)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_port: u16,
}

impl OAuthClient {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_port: u16,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_port,
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}", self.redirect_port)
    }

    /// Consent page URL for the given anti-forgery `state`
    pub fn authorization_url(&self, state: &str) -> DaybookResult<Url> {
        Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri().as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| auth_error(&format!("Failed to build authorization URL: {}", e)))
    }
}

/// Whether a request to the listener is the OAuth redirect rather than a stray hit
pub fn is_callback(request_path: &str) -> bool {
    Url::parse(&format!("http://127.0.0.1{}", request_path))
        .map(|url| {
            url.query_pairs()
                .any(|(key, _)| matches!(key.as_ref(), "code" | "state" | "error"))
        })
        .unwrap_or(false)
}

/// Pull the authorization code out of the redirect request path
pub fn parse_callback(request_path: &str, expected_state: &str) -> DaybookResult<String> {
    let url = Url::parse(&format!("http://127.0.0.1{}", request_path))
        .map_err(|e| auth_error(&format!("Malformed callback URL: {}", e)))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Err(auth_error(&format!("Authorization denied: {}", value))),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(auth_error("State mismatch in authorization callback"));
    }

    code.ok_or_else(|| auth_error("No authorization code found in callback"))
}

/// Run the browser consent flow and exchange the code for a token
pub async fn run_installed_flow(oauth: &OAuthClient, client: &Client) -> DaybookResult<Token> {
    // Generate random state for security
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = oauth.authorization_url(&state)?;

    // Start local server to receive the callback before sending the user off
    let server = tiny_http::Server::http(("127.0.0.1", oauth.redirect_port))
        .map_err(|e| auth_error(&format!("Failed to start callback listener: {}", e)))?;

    info!("Opening browser for Google Calendar authorization");
    if let Err(e) = webbrowser::open(auth_url.as_str()) {
        warn!("Could not open browser: {}", e);
    }
    println!("If the browser did not open, visit:\n{}", auth_url);

    let expected_state = state.clone();
    let code = tokio::task::spawn_blocking(move || -> DaybookResult<String> {
        // Ignore favicon fetches and other stray hits on the listener
        let request = loop {
            let request = server.recv()?;
            if is_callback(request.url()) {
                break request;
            }
            request.respond(tiny_http::Response::empty(tiny_http::StatusCode(404)))?;
        };
        let result = parse_callback(request.url(), &expected_state);

        let message = match &result {
            Ok(_) => "Authorization successful! You can close this window.".to_string(),
            Err(e) => format!("Authorization failed: {}", e),
        };
        request.respond(tiny_http::Response::from_string(message))?;

        result
    })
    .await
    .map_err(|e| auth_error(&format!("Callback listener failed: {}", e)))??;

    exchange_code(oauth, client, &code).await
}

/// Exchange an authorization code for tokens
async fn exchange_code(oauth: &OAuthClient, client: &Client, code: &str) -> DaybookResult<Token> {
    let redirect_uri = oauth.redirect_uri();
    let params = [
        ("client_id", oauth.client_id.as_str()),
        ("client_secret", oauth.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = client
        .post(TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| auth_error(&format!("Failed to get token: {}", e)))?;

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(auth_error(&format!("Failed to get token: {}", error_text)));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))?;

    if body.refresh_token.is_none() {
        warn!("Authorization returned no refresh token; it will have to be repeated on expiry");
    }

    Ok(body.into_token(None))
}
