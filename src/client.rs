use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::Credentials;

const API_BASE: &str = "https://api.twitter.com/1.1";

/// `created_at` format of the v1.1 API, e.g. "Wed Oct 10 20:19:24 +0000 2018".
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Why a timeline read produced no timestamp. Never fatal to the run;
/// the caller downgrades it to an unknown status for that one account.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeline request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("timeline request returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("timeline for {0} is empty")]
    EmptyTimeline(String),
    #[error("could not parse created_at {value:?}: {source}")]
    BadTimestamp {
        value: String,
        source: chrono::ParseError,
    },
}

/// The three capabilities a run needs from the platform API.
#[async_trait]
pub trait StatusClient: Send + Sync {
    /// UTC time of the account's most recent tweet.
    async fn last_post_time(&self, screen_name: &str) -> Result<DateTime<Utc>, FetchError>;

    /// Platform id for a screen name, needed to address a direct message.
    async fn lookup_user_id(&self, screen_name: &str) -> Result<String>;

    /// Send `text` as a direct message to the user with `recipient_id`.
    async fn send_direct_message(&self, recipient_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct TimelineTweet {
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id_str: String,
}

pub struct TwitterClient {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl TwitterClient {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, API_BASE)
    }

    pub fn with_base_url(credentials: Credentials, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("whatsupbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            credentials,
            client,
        }
    }

    /// OAuth 1.0a authorization header, PLAINTEXT signature method.
    fn authorization_header(&self) -> String {
        let signature = format!(
            "{}&{}",
            urlencoding::encode(&self.credentials.consumer_secret),
            urlencoding::encode(&self.credentials.access_secret),
        );

        format!(
            "OAuth oauth_consumer_key=\"{}\", oauth_token=\"{}\", \
             oauth_signature_method=\"PLAINTEXT\", oauth_signature=\"{}\", \
             oauth_timestamp=\"{}\", oauth_nonce=\"{}\", oauth_version=\"1.0\"",
            urlencoding::encode(&self.credentials.consumer_key),
            urlencoding::encode(&self.credentials.access_key),
            urlencoding::encode(&signature),
            Utc::now().timestamp(),
            uuid::Uuid::new_v4().simple(),
        )
    }
}

fn parse_created_at(value: &str) -> Result<DateTime<Utc>, FetchError> {
    DateTime::parse_from_str(value, CREATED_AT_FORMAT)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| FetchError::BadTimestamp {
            value: value.to_string(),
            source,
        })
}

#[async_trait]
impl StatusClient for TwitterClient {
    async fn last_post_time(&self, screen_name: &str) -> Result<DateTime<Utc>, FetchError> {
        let url = format!(
            "{}/statuses/user_timeline.json?screen_name={}&count=1",
            self.base_url,
            urlencoding::encode(screen_name),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.authorization_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let tweets: Vec<TimelineTweet> = response.json().await?;
        let newest = tweets
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::EmptyTimeline(screen_name.to_string()))?;

        parse_created_at(&newest.created_at)
    }

    async fn lookup_user_id(&self, screen_name: &str) -> Result<String> {
        let url = format!(
            "{}/users/show.json?screen_name={}",
            self.base_url,
            urlencoding::encode(screen_name),
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.authorization_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "user lookup for {} returned HTTP {}",
                screen_name,
                response.status()
            ));
        }

        let user: UserRecord = response.json().await?;
        Ok(user.id_str)
    }

    async fn send_direct_message(&self, recipient_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/direct_messages/events/new.json", self.base_url);
        let body = json!({
            "event": {
                "type": "message_create",
                "message_create": {
                    "target": { "recipient_id": recipient_id },
                    "message_data": { "text": text },
                }
            }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization_header())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "direct message send returned HTTP {}",
                response.status()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> Credentials {
        Credentials {
            consumer_key: "ck".to_string(),
            consumer_secret: "c secret".to_string(),
            access_key: "ak".to_string(),
            access_secret: "a secret".to_string(),
        }
    }

    #[test]
    fn test_parse_created_at() {
        let parsed = parse_created_at("Wed Oct 10 20:19:24 +0000 2018").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap());
    }

    #[test]
    fn test_parse_created_at_normalizes_offset_to_utc() {
        let parsed = parse_created_at("Wed Oct 10 20:19:24 +0200 2018").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2018, 10, 10, 18, 19, 24).unwrap());
    }

    #[test]
    fn test_parse_created_at_rejects_garbage() {
        assert!(matches!(
            parse_created_at("not a timestamp"),
            Err(FetchError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_authorization_header_shape() {
        let client = TwitterClient::new(credentials());
        let header = client.authorization_header();
        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_consumer_key=\"ck\""));
        assert!(header.contains("oauth_token=\"ak\""));
        assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
        // secrets are percent-encoded once each, then once more as a
        // header parameter value
        assert!(header.contains("oauth_signature=\"c%2520secret%26a%2520secret\""));
    }

    #[test]
    fn test_nonces_are_unique() {
        let client = TwitterClient::new(credentials());
        assert_ne!(client.authorization_header(), client.authorization_header());
    }
}
