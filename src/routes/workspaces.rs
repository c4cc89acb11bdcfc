use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{record_activity, ACTION_WORKSPACE_DELETED, ACTION_WORKSPACE_UPDATED};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::membership::{active_member_count, resolve_admin, resolve_member};
use crate::models::Workspace;
use crate::schema::workspaces;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkspaceRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<Option<String>>,
    pub max_users: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub max_users: i32,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<WorkspaceResponse>> {
    let mut conn = state.db()?;
    resolve_member(&mut conn, workspace_id, user.user_id)?;

    let workspace = load_active_workspace(&mut conn, workspace_id)?;
    Ok(Json(workspace_to_response(workspace)))
}

pub async fn update_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateWorkspaceRequest>,
) -> AppResult<Json<WorkspaceResponse>> {
    let mut conn = state.db()?;

    let updated = conn.transaction::<Workspace, AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;
        let workspace = load_active_workspace(conn, workspace_id)?;

        let mut new_name = workspace.name.clone();
        if let Some(ref name) = payload.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(AppError::bad_request("name must not be empty"));
            }
            new_name = trimmed.to_string();
        }

        let new_description = match payload.description {
            Some(ref value) => value.clone(),
            None => workspace.description.clone(),
        };

        let new_max_users = match payload.max_users {
            Some(max_users) => {
                if max_users < 1 {
                    return Err(AppError::bad_request("maxUsers must be at least 1"));
                }
                let members = active_member_count(conn, workspace_id)?;
                if i64::from(max_users) < members {
                    return Err(AppError::bad_request(
                        "maxUsers cannot be below the current member count",
                    ));
                }
                max_users
            }
            None => workspace.max_users,
        };

        let now = Utc::now().naive_utc();
        diesel::update(workspaces::table.find(workspace_id))
            .set((
                workspaces::name.eq(&new_name),
                workspaces::description.eq(&new_description),
                workspaces::max_users.eq(new_max_users),
                workspaces::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_WORKSPACE_UPDATED,
            "workspace",
            Some(workspace_id),
            json!({ "name": new_name, "maxUsers": new_max_users }),
        )?;

        Ok(workspaces::table.find(workspace_id).first(conn)?)
    })?;

    Ok(Json(workspace_to_response(updated)))
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;
        load_active_workspace(conn, workspace_id)?;

        let now = Utc::now().naive_utc();
        diesel::update(workspaces::table.find(workspace_id))
            .set((
                workspaces::is_active.eq(false),
                workspaces::deleted_at.eq(Some(now)),
                workspaces::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_WORKSPACE_DELETED,
            "workspace",
            Some(workspace_id),
            json!({}),
        )?;

        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Soft-deleted workspaces stay on disk but are invisible to every endpoint.
pub(super) fn load_active_workspace(
    conn: &mut PgConnection,
    workspace_id: Uuid,
) -> AppResult<Workspace> {
    let workspace: Workspace = workspaces::table
        .find(workspace_id)
        .filter(workspaces::deleted_at.is_null())
        .first(conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    Ok(workspace)
}

pub(super) fn workspace_to_response(workspace: Workspace) -> WorkspaceResponse {
    WorkspaceResponse {
        id: workspace.id,
        name: workspace.name,
        description: workspace.description,
        max_users: workspace.max_users,
        is_active: workspace.is_active,
        created_at: to_iso(workspace.created_at),
        updated_at: to_iso(workspace.updated_at),
    }
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}
