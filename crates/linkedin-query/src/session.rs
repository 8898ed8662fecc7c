//! Authenticated browsing session: login, search and the page currently shown.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::form::Form;

/// Desktop browser identity; the site serves a different page shape to unknown agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_3) \
                              AppleWebKit/537.75.14 (KHTML, like Gecko) \
                              Version/7.0.3 Safari/7046A194A";

pub const SEARCH_FORM_ID: &str = "global-search";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Login failed: still on the login endpoint after submitting credentials")]
    LoginFailed,
    #[error("Page not found: {url}")]
    NotFound { url: String },
    #[error("Server error {status} from {url}")]
    InternalServerError { url: String, status: u16 },
    #[error("Request to {url} timed out")]
    Timeout { url: String },
    #[error("No {0} form on the current page")]
    FormNotFound(&'static str),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// A fetched document together with the address it was finally served from.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

/// A logged-in client. Only [`Session::authenticate`] creates one, so holding
/// a `Session` means the login went through.
///
/// The cookie jar and the current page make this strictly sequential: share
/// it behind `&mut` or give each concurrent query its own session.
#[derive(Debug)]
pub struct Session {
    client: Client,
    current: Page,
}

impl Session {
    /// Opens the home page, fills the login form and submits it.
    ///
    /// Still being on the login endpoint afterwards means the site rejected
    /// the credentials.
    pub async fn authenticate(
        config: &SessionConfig,
        credentials: &Credentials,
    ) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .cookie_store(true)
            .build()?;

        let home_url = Url::parse(&config.base_url)?;
        let login_url = home_url.join(crate::LOGIN_SUBMIT_PATH)?;

        log::info!("Opening {}...", home_url);
        let home = fetch(client.get(home_url.clone()), &home_url).await?;

        let mut form = Form::all(&home.html, &home.url)
            .into_iter()
            .find(|f| same_endpoint(&f.action, &login_url))
            .ok_or(SessionError::FormNotFound("login"))?;
        form.set("session_key", &credentials.username);
        form.set("session_password", &credentials.password);

        log::info!("Logging in as {}...", credentials.username);
        let landed = submit(&client, &form).await?;

        if same_endpoint(&landed.url, &login_url) {
            log::debug!("Login rejected, still at {}", landed.url);
            return Err(SessionError::LoginFailed);
        }

        log::info!("Logged in, landed on {}", landed.url);
        Ok(Self {
            client,
            current: landed,
        })
    }

    pub fn current_page(&self) -> &Page {
        &self.current
    }

    /// Submits the search form of the current page with `query` as keywords
    /// and returns the results document, which becomes the current page.
    pub async fn search(&mut self, query: &str) -> Result<&Page, SessionError> {
        let mut form = Form::all(&self.current.html, &self.current.url)
            .into_iter()
            .find(|f| f.id.as_deref() == Some(SEARCH_FORM_ID))
            .ok_or(SessionError::FormNotFound("search"))?;
        form.set("keywords", query);

        log::info!("Searching for {:?}...", query);
        self.current = submit(&self.client, &form).await?;
        Ok(&self.current)
    }
}

async fn submit(client: &Client, form: &Form) -> Result<Page, SessionError> {
    log::debug!(
        "Submitting {} {} with fields {:?}",
        form.method,
        form.action,
        form.fields.iter().map(|(name, _)| name).collect::<Vec<_>>()
    );
    let request = if form.method == Method::POST {
        client.post(form.action.clone()).form(&form.fields)
    } else {
        client.get(form.action.clone()).query(&form.fields)
    };
    fetch(request, &form.action).await
}

async fn fetch(request: RequestBuilder, url: &Url) -> Result<Page, SessionError> {
    let response = request
        .send()
        .await
        .inspect_err(|e| log::error!("HTTP error: {e:?}"))
        .map_err(|e| classify(e, url))?;
    let response = check_status(response)?;

    let url = response.url().clone();
    let html = response
        .text()
        .await
        .inspect_err(|e| log::error!("Decode error: {e:?}"))
        .map_err(|e| classify(e, &url))?;

    Ok(Page { url, html })
}

fn classify(error: reqwest::Error, url: &Url) -> SessionError {
    if error.is_timeout() {
        SessionError::Timeout {
            url: url.to_string(),
        }
    } else {
        SessionError::HttpError(error)
    }
}

fn check_status(response: Response) -> Result<Response, SessionError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SessionError::NotFound {
            url: response.url().to_string(),
        });
    }
    if status.is_server_error() {
        return Err(SessionError::InternalServerError {
            url: response.url().to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.error_for_status()?)
}

/// Same scheme, host, port and path; query and fragment are ignored.
fn same_endpoint(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path() == b.path()
}
