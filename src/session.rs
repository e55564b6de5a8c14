//! Building the authenticated client shared by every worker.
//!
//! A `reqwest` client is an `Arc` around its connection pool and cookie jar,
//! so clones handed to workers all see the same session.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use scraper::{Html, Selector};
use tracing::info;
use url::Url;

use crate::error::{Result, ScrapeError};

pub const LOGIN_URL: &str = "https://secure.birds.cornell.edu/cassso/login";
const USER_AGENT: &str = concat!("magpie/", env!("CARGO_PKG_VERSION"));
const TOKEN_SELECTOR: &str = r#"input[name="lt"]"#;

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cookie-store client with no session yet.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Client that sends an existing session cookie header on every request.
pub fn with_cookie(cookie: &str) -> Result<Client> {
    let value = HeaderValue::from_str(cookie.trim())
        .map_err(|e| ScrapeError::Login(format!("invalid cookie header: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, value);

    Ok(Client::builder()
        .cookie_store(true)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?)
}

/// Login ticket embedded in the login form.
pub fn extract_login_token(html: &str) -> Result<String> {
    let selector = Selector::parse(TOKEN_SELECTOR).map_err(|e| ScrapeError::Selector {
        selector: TOKEN_SELECTOR,
        message: e.to_string(),
    })?;
    let doc = Html::parse_document(html);

    doc.select(&selector)
        .find_map(|input| input.value().attr("value"))
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::Login("no login token on the login page".into()))
}

/// Sign in through the login form; the session cookies land in `client`'s store.
pub fn login(client: &Client, login_url: &Url, credentials: &Credentials) -> Result<()> {
    let page = client.get(login_url.clone()).send()?.error_for_status()?.text()?;
    let token = extract_login_token(&page)?;

    let form = [
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("lt", token.as_str()),
        ("execution", "e1s1"),
        ("_eventId", "submit"),
    ];
    let response = client
        .post(login_url.clone())
        .form(&form)
        .send()?
        .error_for_status()?;

    if response.url().path() == login_url.path() && response.url().host() == login_url.host() {
        return Err(ScrapeError::Login(format!(
            "credentials for '{}' were rejected",
            credentials.username
        )));
    }

    info!(
        action = "login",
        component = "session",
        username = %credentials.username,
        landing = %response.url(),
        "Signed in"
    );
    Ok(())
}
