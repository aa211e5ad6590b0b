use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DecodeError, Result};
use crate::session::check_response;

/// Format of the timestamps in the stats payload.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// API token sent in the `EVB_AUTH` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Authorization {
    token: String,
}

impl Authorization {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorization").field("token", &"<redacted>").finish()
    }
}

#[derive(Debug, Deserialize)]
struct EditPayload {
    error: bool,
    code: i64,
    is_video: bool,
    media_url: String,
    media_size: u64,
    command_str: String,
}

/// Result of a POST to `/edit/`. The edited media itself stays on the
/// server until [`EditResult::download`] is called.
#[derive(Debug, Clone, Serialize)]
pub struct EditResult {
    error: bool,
    code: i64,
    is_video: bool,
    media_url: String,
    media_size: u64,
    command_str: String,
    #[serde(skip)]
    client: Client,
}

impl EditResult {
    /// Decode an edit response body. `client` is kept as a handle for
    /// [`download`](Self::download); it is shared, not owned.
    pub fn from_json(body: &[u8], client: Client) -> std::result::Result<Self, DecodeError> {
        let payload: EditPayload = serde_json::from_slice(body)?;

        Ok(Self {
            error: payload.error,
            code: payload.code,
            is_video: payload.is_video,
            media_url: payload.media_url,
            media_size: payload.media_size,
            command_str: payload.command_str,
            client,
        })
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn is_video(&self) -> bool {
        self.is_video
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    /// Size of the edited media in bytes.
    pub fn media_size(&self) -> u64 {
        self.media_size
    }

    /// Command line the server actually applied.
    pub fn command_str(&self) -> &str {
        &self.command_str
    }

    /// Fetch the edited media. Every call issues a new request.
    pub async fn download(&self) -> Result<Vec<u8>> {
        debug!("Downloading edited media from: {}", self.media_url);

        let response = self.client.get(&self.media_url).send().await?;
        let response = check_response(response)?;
        let bytes = response.bytes().await?;

        info!("Downloaded {} bytes of edited media", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    error: bool,
    code: i64,
    email: String,
    level: String,
    remaining_daily_requests: i64,
    videos_edited: u64,
    photos_edited: u64,
    total_edited: u64,
    first_edit: String,
    latest_edit: String,
    favourite_cmd: String,
}

/// Account usage snapshot returned by `/stats/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsResult {
    error: bool,
    code: i64,
    email: String,
    level: String,
    remaining_daily_requests: i64,
    videos_edited: u64,
    photos_edited: u64,
    total_edited: u64,
    first_edit: NaiveDateTime,
    latest_edit: NaiveDateTime,
    favourite_cmd: String,
}

impl StatsResult {
    pub fn from_json(body: &[u8]) -> std::result::Result<Self, DecodeError> {
        let payload: StatsPayload = serde_json::from_slice(body)?;

        Ok(Self {
            first_edit: parse_timestamp("first_edit", &payload.first_edit)?,
            latest_edit: parse_timestamp("latest_edit", &payload.latest_edit)?,
            error: payload.error,
            code: payload.code,
            email: payload.email,
            level: payload.level,
            remaining_daily_requests: payload.remaining_daily_requests,
            videos_edited: payload.videos_edited,
            photos_edited: payload.photos_edited,
            total_edited: payload.total_edited,
            favourite_cmd: payload.favourite_cmd,
        })
    }

    pub fn error(&self) -> bool {
        self.error
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Account tier as reported by the server.
    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn remaining_daily_requests(&self) -> i64 {
        self.remaining_daily_requests
    }

    pub fn videos_edited(&self) -> u64 {
        self.videos_edited
    }

    pub fn photos_edited(&self) -> u64 {
        self.photos_edited
    }

    pub fn total_edited(&self) -> u64 {
        self.total_edited
    }

    pub fn first_edit(&self) -> NaiveDateTime {
        self.first_edit
    }

    pub fn latest_edit(&self) -> NaiveDateTime {
        self.latest_edit
    }

    pub fn favourite_cmd(&self) -> &str {
        &self.favourite_cmd
    }
}

fn parse_timestamp(field: &'static str, value: &str) -> std::result::Result<NaiveDateTime, DecodeError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|source| DecodeError::Timestamp {
        field,
        value: value.to_string(),
        format: DATETIME_FORMAT,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn edit_json() -> Value {
        json!({
            "error": false,
            "code": 200,
            "is_video": true,
            "media_url": "https://cdn.example.com/out/abc.mp4",
            "media_size": 1048576,
            "command_str": "tt=hello, reverse"
        })
    }

    fn stats_json() -> Value {
        json!({
            "error": false,
            "code": 200,
            "email": "someone@example.com",
            "level": "premium",
            "remaining_daily_requests": 42,
            "videos_edited": 10,
            "photos_edited": 5,
            "total_edited": 15,
            "first_edit": "2021-03-04 05:06:07",
            "latest_edit": "2022-12-31 23:59:59",
            "favourite_cmd": "reverse"
        })
    }

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_edit_fields_read_back() {
        let result = EditResult::from_json(&bytes(&edit_json()), Client::new()).unwrap();
        assert!(!result.error());
        assert_eq!(result.code(), 200);
        assert!(result.is_video());
        assert_eq!(result.media_url(), "https://cdn.example.com/out/abc.mp4");
        assert_eq!(result.media_size(), 1_048_576);
        assert_eq!(result.command_str(), "tt=hello, reverse");
    }

    #[test]
    fn test_edit_serializes_without_client() {
        let result = EditResult::from_json(&bytes(&edit_json()), Client::new()).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), edit_json());
    }

    #[test]
    fn test_edit_missing_field() {
        let mut value = edit_json();
        value.as_object_mut().unwrap().remove("media_url");
        let err = EditResult::from_json(&bytes(&value), Client::new()).unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_edit_rejects_coerced_types() {
        let mut value = edit_json();
        value["is_video"] = json!("true");
        assert!(EditResult::from_json(&bytes(&value), Client::new()).is_err());
    }

    #[test]
    fn test_edit_not_json() {
        assert!(EditResult::from_json(b"<html>oops</html>", Client::new()).is_err());
    }

    #[test]
    fn test_stats_fields_and_dates() {
        let stats = StatsResult::from_json(&bytes(&stats_json())).unwrap();
        assert_eq!(stats.email(), "someone@example.com");
        assert_eq!(stats.level(), "premium");
        assert_eq!(stats.remaining_daily_requests(), 42);
        assert_eq!(stats.videos_edited(), 10);
        assert_eq!(stats.photos_edited(), 5);
        assert_eq!(stats.total_edited(), 15);
        assert_eq!(stats.favourite_cmd(), "reverse");
        assert_eq!(
            stats.first_edit(),
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap().and_hms_opt(5, 6, 7).unwrap()
        );
        assert_eq!(
            stats.latest_edit(),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap().and_hms_opt(23, 59, 59).unwrap()
        );
    }

    #[test]
    fn test_stats_missing_any_field() {
        let full = stats_json();
        for key in full.as_object().unwrap().keys() {
            let mut value = full.clone();
            value.as_object_mut().unwrap().remove(key);
            assert!(
                StatsResult::from_json(&bytes(&value)).is_err(),
                "missing {key} should fail"
            );
        }
    }

    #[test]
    fn test_stats_bad_timestamp() {
        let mut value = stats_json();
        value["latest_edit"] = json!("2022-12-31T23:59:59Z");
        let err = StatsResult::from_json(&bytes(&value)).unwrap_err();
        match err {
            DecodeError::Timestamp { field, value, .. } => {
                assert_eq!(field, "latest_edit");
                assert_eq!(value, "2022-12-31T23:59:59Z");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_authorization_debug_redacts_token() {
        let auth = Authorization::new("secret-token");
        assert_eq!(auth.token(), "secret-token");
        assert!(!format!("{:?}", auth).contains("secret-token"));
    }
}
