use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::activity::{
    record_activity, ACTION_POST_CREATED, ACTION_POST_DELETED, ACTION_POST_UPDATED,
};
use crate::auth::AuthenticatedUser;
use crate::content::{classify_post_type, merge_content, PostType};
use crate::error::{AppError, AppResult};
use crate::membership::resolve_member;
use crate::models::{NewPost, Post};
use crate::schema::posts;
use crate::state::AppState;

use super::workspaces::to_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Scheduled,
    Published,
}

impl PostStatus {
    fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub id: Option<Uuid>,
    pub topic: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    pub post_type: Option<PostType>,
    pub status: Option<PostStatus>,
    pub scheduled_at: Option<String>,
    pub published_at: Option<String>,
    /// Everything else in the body is treated as content fields; unknown
    /// keys are dropped by the merge.
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub topic: Option<String>,
    pub platforms: Option<Vec<String>>,
    pub post_type: Option<PostType>,
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub scheduled_at: Option<Option<String>>,
    #[serde(default)]
    pub published_at: Option<Option<String>>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

/// Caller-facing shape: content sub-fields are flattened alongside the
/// top-level post columns.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub topic: String,
    pub platforms: Vec<String>,
    pub post_type: String,
    pub status: String,
    pub scheduled_at: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<PostResponse>>> {
    let mut conn = state.db()?;
    resolve_member(&mut conn, workspace_id, user.user_id)?;

    let rows: Vec<Post> = posts::table
        .filter(posts::workspace_id.eq(workspace_id))
        .order(posts::created_at.desc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(post_to_response).collect()))
}

pub async fn create_post(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<PostResponse>)> {
    let topic = payload.topic.trim().to_string();
    if topic.is_empty() {
        return Err(AppError::bad_request("topic must not be empty"));
    }

    let scheduled_at = parse_rfc3339(payload.scheduled_at.as_deref())?;
    let published_at = parse_rfc3339(payload.published_at.as_deref())?;

    let content = merge_content(&json!({}), &Value::Object(payload.content));
    let post_type = classify_post_type(&content, payload.post_type);
    let status = payload.status.unwrap_or(PostStatus::Draft);

    let mut conn = state.db()?;

    let post = conn.transaction::<Post, AppError, _>(|conn| {
        resolve_member(conn, workspace_id, user.user_id)?;

        let new_post = NewPost {
            id: payload.id.unwrap_or_else(Uuid::new_v4),
            workspace_id,
            topic: topic.clone(),
            platforms: payload.platforms.clone(),
            post_type: post_type.as_str().to_string(),
            content: content.clone(),
            status: status.as_str().to_string(),
            scheduled_at,
            published_at,
        };

        // Client-supplied ids can collide with an existing post.
        diesel::insert_into(posts::table)
            .values(&new_post)
            .execute(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AppError::new(StatusCode::CONFLICT, "a post with this id already exists")
                }
                other => AppError::from(other),
            })?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_POST_CREATED,
            "post",
            Some(new_post.id),
            json!({ "topic": topic, "postType": post_type.as_str() }),
        )?;

        Ok(posts::table.find(new_post.id).first(conn)?)
    })?;

    Ok((StatusCode::CREATED, Json(post_to_response(post))))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path((workspace_id, post_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> AppResult<Json<PostResponse>> {
    let mut conn = state.db()?;
    resolve_member(&mut conn, workspace_id, user.user_id)?;

    let post = load_post(&mut conn, workspace_id, post_id)?;
    Ok(Json(post_to_response(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path((workspace_id, post_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdatePostRequest>,
) -> AppResult<Json<PostResponse>> {
    let mut conn = state.db()?;

    let post = conn.transaction::<Post, AppError, _>(|conn| {
        resolve_member(conn, workspace_id, user.user_id)?;
        let existing = load_post(conn, workspace_id, post_id)?;

        let topic = match payload.topic {
            Some(ref raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(AppError::bad_request("topic must not be empty"));
                }
                trimmed.to_string()
            }
            None => existing.topic.clone(),
        };

        let platforms = payload.platforms.clone().unwrap_or(existing.platforms.clone());
        let status = match payload.status {
            Some(status) => status.as_str().to_string(),
            None => existing.status.clone(),
        };

        let scheduled_at = match payload.scheduled_at {
            Some(ref value) => parse_rfc3339(value.as_deref())?,
            None => existing.scheduled_at,
        };
        let published_at = match payload.published_at {
            Some(ref value) => parse_rfc3339(value.as_deref())?,
            None => existing.published_at,
        };

        // Partial merge on top of the stored blob, then re-derive the type:
        // a carousel stays a carousel no matter what the caller asked for.
        let content = merge_content(&existing.content, &Value::Object(payload.content));
        let requested_type = payload.post_type.or(parse_post_type(&existing.post_type));
        let post_type = classify_post_type(&content, requested_type);

        let now = Utc::now().naive_utc();
        diesel::update(posts::table.find(post_id))
            .set((
                posts::topic.eq(&topic),
                posts::platforms.eq(&platforms),
                posts::post_type.eq(post_type.as_str()),
                posts::content.eq(&content),
                posts::status.eq(&status),
                posts::scheduled_at.eq(scheduled_at),
                posts::published_at.eq(published_at),
                posts::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_POST_UPDATED,
            "post",
            Some(post_id),
            json!({ "topic": topic, "postType": post_type.as_str() }),
        )?;

        Ok(posts::table.find(post_id).first(conn)?)
    })?;

    Ok(Json(post_to_response(post)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path((workspace_id, post_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        resolve_member(conn, workspace_id, user.user_id)?;
        let existing = load_post(conn, workspace_id, post_id)?;

        diesel::delete(posts::table.find(post_id)).execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_POST_DELETED,
            "post",
            Some(post_id),
            json!({ "topic": existing.topic }),
        )?;

        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn load_post(conn: &mut PgConnection, workspace_id: Uuid, post_id: Uuid) -> AppResult<Post> {
    let post: Option<Post> = posts::table
        .find(post_id)
        .filter(posts::workspace_id.eq(workspace_id))
        .first(conn)
        .optional()?;
    post.ok_or_else(AppError::not_found)
}

fn parse_post_type(raw: &str) -> Option<PostType> {
    match raw {
        "post" => Some(PostType::Post),
        "carousel" => Some(PostType::Carousel),
        "reel" => Some(PostType::Reel),
        "story" => Some(PostType::Story),
        "video" => Some(PostType::Video),
        _ => None,
    }
}

fn post_to_response(post: Post) -> PostResponse {
    let content = match post.content {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    PostResponse {
        id: post.id,
        workspace_id: post.workspace_id,
        topic: post.topic,
        platforms: post.platforms,
        post_type: post.post_type,
        status: post.status,
        scheduled_at: post.scheduled_at.map(to_iso),
        published_at: post.published_at.map(to_iso),
        created_at: to_iso(post.created_at),
        updated_at: to_iso(post.updated_at),
        content,
    }
}

fn parse_rfc3339(raw: Option<&str>) -> AppResult<Option<NaiveDateTime>> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let parsed = DateTime::parse_from_rfc3339(value)
                .map_err(|_| AppError::bad_request("timestamps must be RFC 3339"))?;
            Ok(Some(parsed.with_timezone(&Utc).naive_utc()))
        }
    }
}
