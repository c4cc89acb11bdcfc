use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use diesel::{dsl::count_star, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::membership::resolve_admin;
use crate::models::ActivityLog;
use crate::schema::activity_logs;
use crate::state::AppState;

use super::workspaces::to_iso;

const DEFAULT_PER_PAGE: i64 = 50;
const MAX_PER_PAGE: i64 = 200;
const MAX_PAGE: i64 = 1_000_000;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub user_id: Option<Uuid>,
    pub action: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub entries: Vec<ActivityEntry>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

pub async fn list_activity(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
    user: AuthenticatedUser,
) -> AppResult<Json<ActivityPage>> {
    let (page, per_page) = resolve_paging(query.page, query.per_page)?;

    let from = parse_timestamp(query.from.as_deref())?;
    let to = parse_timestamp(query.to.as_deref())?;

    let mut conn = state.db()?;
    resolve_admin(&mut conn, workspace_id, user.user_id)?;

    let mut count_query = activity_logs::table
        .filter(activity_logs::workspace_id.eq(workspace_id))
        .into_boxed();
    let mut page_query = activity_logs::table
        .filter(activity_logs::workspace_id.eq(workspace_id))
        .into_boxed();

    if let Some(user_id) = query.user_id {
        count_query = count_query.filter(activity_logs::user_id.eq(user_id));
        page_query = page_query.filter(activity_logs::user_id.eq(user_id));
    }
    if let Some(ref action) = query.action {
        count_query = count_query.filter(activity_logs::action.eq(action));
        page_query = page_query.filter(activity_logs::action.eq(action));
    }
    if let Some(from) = from {
        count_query = count_query.filter(activity_logs::created_at.ge(from));
        page_query = page_query.filter(activity_logs::created_at.ge(from));
    }
    if let Some(to) = to {
        count_query = count_query.filter(activity_logs::created_at.le(to));
        page_query = page_query.filter(activity_logs::created_at.le(to));
    }

    let total: i64 = count_query.select(count_star()).first(&mut conn)?;

    let rows: Vec<ActivityLog> = page_query
        .order(activity_logs::created_at.desc())
        .offset((page - 1) * per_page)
        .limit(per_page)
        .load(&mut conn)?;

    let entries = rows
        .into_iter()
        .map(|row| ActivityEntry {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            resource_type: row.resource_type,
            resource_id: row.resource_id,
            details: row.details,
            created_at: to_iso(row.created_at),
        })
        .collect();

    Ok(Json(ActivityPage {
        entries,
        page,
        per_page,
        total,
    }))
}

/// Bounds the page number so the offset arithmetic stays well inside i64
/// range; anything past `MAX_PAGE` is rejected rather than clamped.
fn resolve_paging(page: Option<i64>, per_page: Option<i64>) -> AppResult<(i64, i64)> {
    let page = page.unwrap_or(1);
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(AppError::bad_request(format!(
            "page must be between 1 and {MAX_PAGE}"
        )));
    }
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    Ok((page, per_page))
}

fn parse_timestamp(raw: Option<&str>) -> AppResult<Option<chrono::NaiveDateTime>> {
    match raw {
        None => Ok(None),
        Some(value) => {
            let parsed = DateTime::parse_from_rfc3339(value)
                .map_err(|_| AppError::bad_request("timestamps must be RFC 3339"))?;
            Ok(Some(parsed.with_timezone(&Utc).naive_utc()))
        }
    }
}
