//! Authenticated session against the EditVideoBot API.
//!
//! A [`Session`] starts closed. [`Session::open`] acquires an HTTP client
//! (or adopts the one supplied at construction) and [`Session::close`]
//! releases it again, unless the caller supplied it.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, info, warn};

use crate::commands::{serialize_sequence, Command};
use crate::config::{ApiConfig, DEFAULT_ENDPOINT};
use crate::error::{EvbError, RateLimitedResponse, Result};
use crate::responses::{Authorization, EditResult, StatsResult};

/// Extension used for the uploaded file name when the caller gives none.
pub const DEFAULT_EXTENSION: &str = "mp4";

/// Header carrying the API token.
pub const AUTH_HEADER: &str = "EVB_AUTH";

/// Map an HTTP response to success or the matching error.
///
/// Anything below 400 passes through; 401 and 429 get their own variants.
pub fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return Ok(response);
    }

    let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
    warn!("{} answered {}", response.url(), status);

    match status {
        StatusCode::UNAUTHORIZED => Err(EvbError::Authorization(reason)),
        StatusCode::TOO_MANY_REQUESTS => {
            Err(EvbError::RateLimit(RateLimitedResponse::from_response(&response)))
        }
        _ => Err(EvbError::Http {
            status_code: status.as_u16(),
            reason,
        }),
    }
}

#[derive(Debug)]
pub struct Session {
    authorization: Authorization,
    endpoint: String,
    user_agent: String,
    client: Option<Client>,
    client_is_passed: bool,
    is_open: bool,
    acquisitions: u32,
}

impl Session {
    /// Build a closed session. A supplied `client` stays owned by the caller:
    /// [`close`](Self::close) will not release it.
    pub fn new(authorization: Authorization, client: Option<Client>) -> Self {
        Self {
            authorization,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: format!("evb/{}", env!("CARGO_PKG_VERSION")),
            client_is_passed: client.is_some(),
            client,
            is_open: false,
            acquisitions: 0,
        }
    }

    pub fn from_api_key<S: Into<String>>(api_key: S, client: Option<Client>) -> Self {
        Self::new(Authorization::new(api_key), client)
    }

    pub fn from_config(config: &ApiConfig, api_key: &str) -> Result<Self> {
        let mut session = Self::from_api_key(api_key, None).with_endpoint(&config.endpoint)?;
        session.user_agent = config.user_agent.clone();
        Ok(session)
    }

    /// Point the session at a different base URL.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        Url::parse(endpoint)
            .map_err(|e| EvbError::Config(format!("Invalid endpoint {:?}: {}", endpoint, e)))?;

        self.endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{}/", endpoint)
        };
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    /// Whether [`close`](Self::close) releases the HTTP client.
    pub fn owns_connection(&self) -> bool {
        !self.client_is_passed
    }

    /// Open the session, acquiring an HTTP client if there is none yet.
    /// Calling it again while open reuses the existing client.
    pub fn open(&mut self) -> Result<()> {
        if self.client.is_none() {
            let client = Client::builder().user_agent(&self.user_agent).build()?;
            self.client = Some(client);
            self.acquisitions += 1;
            debug!("Acquired HTTP client for {}", self.endpoint);
        }

        if !self.is_open {
            info!("Session opened against {}", self.endpoint);
        }
        self.is_open = true;
        Ok(())
    }

    /// Close the session. A client supplied at construction is left alone.
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }

        if !self.client_is_passed && self.client.take().is_some() {
            debug!("Released HTTP client for {}", self.endpoint);
        }
        self.is_open = false;
        info!("Session closed");
    }

    fn client(&self) -> Result<&Client> {
        match (&self.client, self.is_open) {
            (Some(client), true) => Ok(client),
            _ => Err(EvbError::SessionNotOpen),
        }
    }

    /// Submit media and commands to `/edit/`.
    ///
    /// Only the result descriptor is fetched; call [`EditResult::download`]
    /// for the edited media.
    pub async fn edit(&self, media: Vec<u8>, commands: &[Command], extension: &str) -> Result<EditResult> {
        let client = self.client()?;
        let command_str = serialize_sequence(commands);
        let url = format!("{}edit/", self.endpoint);

        info!(
            "Submitting {} bytes as input.{} with commands: {}",
            media.len(),
            extension,
            command_str
        );

        let file = Part::bytes(media)
            .file_name(format!("input.{}", extension))
            .mime_str("application/octet-stream")?;
        let form = Form::new().part("file", file).text("commands", command_str);

        let response = client
            .post(&url)
            .header(AUTH_HEADER, self.authorization.token())
            .multipart(form)
            .send()
            .await?;
        let response = check_response(response)?;
        let body = response.bytes().await?;

        let result = EditResult::from_json(&body, client.clone())?;
        debug!(
            "Edit finished: code={} is_video={} media_size={} url={}",
            result.code(),
            result.is_video(),
            result.media_size(),
            result.media_url()
        );
        Ok(result)
    }

    /// [`edit`](Self::edit) with the default `mp4` extension.
    pub async fn edit_default(&self, media: Vec<u8>, commands: &[Command]) -> Result<EditResult> {
        self.edit(media, commands, DEFAULT_EXTENSION).await
    }

    /// Read `path` and submit it, using its extension for the upload name.
    pub async fn edit_file<P: AsRef<Path>>(&self, path: P, commands: &[Command]) -> Result<EditResult> {
        let path = path.as_ref();
        // Fail before touching the disk when closed.
        self.client()?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string();
        let media = tokio::fs::read(path).await?;

        self.edit(media, commands, &extension).await
    }

    /// Fetch account statistics from `/stats/`.
    pub async fn stats(&self) -> Result<StatsResult> {
        let client = self.client()?;
        let url = format!("{}stats/", self.endpoint);
        debug!("Requesting stats from: {}", url);

        let response = client
            .get(&url)
            .header(AUTH_HEADER, self.authorization.token())
            .send()
            .await?;
        let response = check_response(response)?;
        let body = response.bytes().await?;

        Ok(StatsResult::from_json(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_is_idempotent_and_close_releases() {
        let mut session = Session::from_api_key("key", None);
        assert!(!session.is_open());
        assert!(session.owns_connection());

        session.open().unwrap();
        session.open().unwrap();
        assert!(session.is_open());
        assert_eq!(session.acquisitions, 1);

        session.close();
        assert!(!session.is_open());
        assert!(session.client.is_none());

        // reopening acquires a fresh client
        session.open().unwrap();
        assert_eq!(session.acquisitions, 2);
    }

    #[test]
    fn test_supplied_client_survives_close() {
        let mut session = Session::from_api_key("key", Some(Client::new()));
        assert!(!session.owns_connection());
        assert!(!session.is_open());

        session.open().unwrap();
        assert_eq!(session.acquisitions, 0);

        session.close();
        assert!(!session.is_open());
        assert!(session.client.is_some());
    }

    #[tokio::test]
    async fn test_requests_require_open_session() {
        // Unroutable endpoint: any network attempt would fail differently.
        let session = Session::from_api_key("key", None)
            .with_endpoint("http://127.0.0.1:9/api/v1")
            .unwrap();

        let err = session.stats().await.unwrap_err();
        assert!(matches!(err, EvbError::SessionNotOpen));

        let err = session.edit(vec![1, 2, 3], &[Command::Reverse], "mp4").await.unwrap_err();
        assert!(matches!(err, EvbError::SessionNotOpen));

        let err = session.edit_file("/no/such/file.mp4", &[]).await.unwrap_err();
        assert!(matches!(err, EvbError::SessionNotOpen));
    }

    #[test]
    fn test_endpoint_normalization() {
        let session = Session::from_api_key("key", None)
            .with_endpoint("http://localhost:8080/api/v1")
            .unwrap();
        assert_eq!(session.endpoint(), "http://localhost:8080/api/v1/");

        assert_eq!(Session::from_api_key("key", None).endpoint(), DEFAULT_ENDPOINT);
        assert!(Session::from_api_key("key", None).with_endpoint("::nope").is_err());
    }
}
