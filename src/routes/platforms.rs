use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::platforms::browser::BrowserTool;
use crate::platforms::twitter::{
    validate_media, validate_tweet, MediaAttachment, TweetReceipt, TwitterClient, PLATFORM,
};
use crate::platforms::voice::{build_persona, VoicePersona};
use crate::platforms::load_credentials;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterPostRequest {
    pub text: String,
    #[serde(default)]
    pub media: Vec<MediaAttachment>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterPostResponse {
    pub tweet: TweetReceipt,
    pub media_count: usize,
}

#[derive(Serialize)]
pub struct BrowserToolsResponse {
    pub tools: Vec<BrowserTool>,
}

pub async fn post_to_twitter(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<TwitterPostRequest>,
) -> AppResult<Json<TwitterPostResponse>> {
    validate_tweet(&payload.text, payload.media.len()).map_err(AppError::bad_request)?;
    for attachment in &payload.media {
        validate_media(attachment).map_err(AppError::bad_request)?;
    }

    let credentials = {
        let mut conn = state.db()?;
        load_credentials(&mut conn, user.user_id, PLATFORM)?
    };

    let client = TwitterClient::from_credentials(&state.config, &credentials.credentials)
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let mut media_ids = Vec::with_capacity(payload.media.len());
    for attachment in &payload.media {
        media_ids.push(client.upload_media(attachment).await?);
    }

    let tweet = client.post_tweet(&payload.text, &media_ids).await?;

    Ok(Json(TwitterPostResponse {
        tweet,
        media_count: media_ids.len(),
    }))
}

/// Tool discovery for the content-strategist agent. Never fails: when the
/// browser session cannot be established the list is empty.
pub async fn browser_tools(State(state): State<AppState>) -> Json<BrowserToolsResponse> {
    let tools = state.browser.tools().await;
    Json(BrowserToolsResponse { tools })
}

pub async fn voice_persona(State(state): State<AppState>) -> Json<VoicePersona> {
    Json(build_persona(&state.config))
}
