use anyhow::{anyhow, Context, Result};
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AppConfig;

pub const PLATFORM: &str = "twitter";
pub const MAX_TWEET_CHARS: usize = 280;
pub const MAX_MEDIA_ATTACHMENTS: usize = 4;

#[derive(Debug, Deserialize)]
struct TwitterCredentials {
    access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TweetReceipt {
    pub id: String,
    pub text: String,
}

/// One media attachment, base64-encoded by the client.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    pub data: String,
    pub mime_type: String,
}

/// Request-side validation, applied before any vendor call is made.
pub fn validate_tweet(text: &str, media_count: usize) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("tweet text must not be empty".to_string());
    }
    if text.chars().count() > MAX_TWEET_CHARS {
        return Err(format!("tweet text exceeds {MAX_TWEET_CHARS} characters"));
    }
    if media_count > MAX_MEDIA_ATTACHMENTS {
        return Err(format!(
            "at most {MAX_MEDIA_ATTACHMENTS} media attachments are allowed"
        ));
    }
    Ok(())
}

/// Checks an attachment before any vendor call; decode errors are the
/// caller's fault, not an upstream failure.
pub fn validate_media(attachment: &MediaAttachment) -> Result<(), String> {
    if base64::engine::general_purpose::STANDARD
        .decode(&attachment.data)
        .is_err()
    {
        return Err("media data is not valid base64".to_string());
    }
    if attachment.mime_type.trim().is_empty() {
        return Err("media mimeType must not be empty".to_string());
    }
    Ok(())
}

/// Thin wrapper over the Twitter v2/v1.1 HTTP API, constructed per request
/// from the caller's stored credentials.
pub struct TwitterClient {
    client: Client,
    api_base: String,
    upload_base: String,
    access_token: String,
}

impl TwitterClient {
    pub fn from_credentials(config: &AppConfig, credentials: &Value) -> Result<Self> {
        let parsed: TwitterCredentials = serde_json::from_value(credentials.clone())
            .context("stored twitter credentials are malformed")?;
        Ok(Self {
            client: Client::new(),
            api_base: config.twitter_api_base.clone(),
            upload_base: config.twitter_upload_base.clone(),
            access_token: parsed.access_token,
        })
    }

    pub async fn upload_media(&self, attachment: &MediaAttachment) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/1.1/media/upload.json", self.upload_base))
            .bearer_auth(&self.access_token)
            .form(&[
                ("media_data", attachment.data.as_str()),
                ("media_category", "tweet_image"),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        body["media_id_string"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("media upload response missing media_id_string"))
    }

    pub async fn post_tweet(&self, text: &str, media_ids: &[String]) -> Result<TweetReceipt> {
        let mut payload = json!({ "text": text });
        if !media_ids.is_empty() {
            payload["media"] = json!({ "media_ids": media_ids });
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let id = body["data"]["id"]
            .as_str()
            .ok_or_else(|| anyhow!("tweet response missing id"))?
            .to_string();
        let text = body["data"]["text"].as_str().unwrap_or(text).to_string();
        Ok(TweetReceipt { id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_text() {
        assert!(validate_tweet("   ", 0).is_err());
    }

    #[test]
    fn accepts_text_at_the_limit() {
        let text = "x".repeat(MAX_TWEET_CHARS);
        assert!(validate_tweet(&text, 0).is_ok());
    }

    #[test]
    fn rejects_text_over_the_limit() {
        let text = "x".repeat(MAX_TWEET_CHARS + 1);
        assert!(validate_tweet(&text, 0).is_err());
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let text = "é".repeat(MAX_TWEET_CHARS);
        assert!(validate_tweet(&text, 0).is_ok());
    }

    #[test]
    fn rejects_more_than_four_attachments() {
        assert!(validate_tweet("hello", MAX_MEDIA_ATTACHMENTS).is_ok());
        assert!(validate_tweet("hello", MAX_MEDIA_ATTACHMENTS + 1).is_err());
    }

    #[test]
    fn rejects_malformed_base64_media() {
        let attachment = MediaAttachment {
            data: "not valid base64!!!".to_string(),
            mime_type: "image/png".to_string(),
        };
        assert!(validate_media(&attachment).is_err());
    }

    #[test]
    fn accepts_well_formed_media() {
        let attachment = MediaAttachment {
            data: base64::engine::general_purpose::STANDARD.encode([0u8, 1, 2, 3]),
            mime_type: "image/png".to_string(),
        };
        assert!(validate_media(&attachment).is_ok());
    }
}
