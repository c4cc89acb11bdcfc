use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{record_activity, ACTION_MEMBER_REMOVED, ACTION_MEMBER_ROLE_CHANGED};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::membership::{admin_count, resolve_admin, resolve_member, Role};
use crate::models::User;
use crate::schema::users;
use crate::state::AppState;

use super::workspaces::to_iso;

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub joined_at: String,
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<MemberResponse>>> {
    let mut conn = state.db()?;
    resolve_member(&mut conn, workspace_id, user.user_id)?;

    let members: Vec<User> = users::table
        .filter(users::workspace_id.eq(workspace_id))
        .filter(users::is_active.eq(true))
        .order(users::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(members.into_iter().map(member_to_response).collect()))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;

        if member_id == user.user_id {
            return Err(AppError::bad_request("cannot remove yourself"));
        }

        let target = load_member(conn, workspace_id, member_id)?;
        if target.role == Role::Admin.as_str() && admin_count(conn, workspace_id)? <= 1 {
            return Err(AppError::bad_request(
                "cannot remove the last admin of the workspace",
            ));
        }

        // Removal detaches; the user row itself is never deleted.
        let now = Utc::now().naive_utc();
        diesel::update(users::table.find(member_id))
            .set((
                users::workspace_id.eq(None::<Uuid>),
                users::role.eq(Role::Viewer.as_str()),
                users::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_MEMBER_REMOVED,
            "member",
            Some(member_id),
            json!({ "email": target.email }),
        )?;

        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Path((workspace_id, member_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<MemberResponse>> {
    let mut conn = state.db()?;

    let updated = conn.transaction::<User, AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;

        if member_id == user.user_id && payload.role != Role::Admin {
            return Err(AppError::bad_request("cannot demote yourself"));
        }

        let target = load_member(conn, workspace_id, member_id)?;
        let demoting_admin =
            target.role == Role::Admin.as_str() && payload.role != Role::Admin;
        if demoting_admin && admin_count(conn, workspace_id)? <= 1 {
            return Err(AppError::bad_request(
                "cannot demote the last admin of the workspace",
            ));
        }

        diesel::update(users::table.find(member_id))
            .set((
                users::role.eq(payload.role.as_str()),
                users::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_MEMBER_ROLE_CHANGED,
            "member",
            Some(member_id),
            json!({ "from": target.role, "to": payload.role.as_str() }),
        )?;

        Ok(users::table.find(member_id).first(conn)?)
    })?;

    Ok(Json(member_to_response(updated)))
}

fn load_member(conn: &mut PgConnection, workspace_id: Uuid, member_id: Uuid) -> AppResult<User> {
    let member: Option<User> = users::table
        .find(member_id)
        .filter(users::workspace_id.eq(workspace_id))
        .filter(users::is_active.eq(true))
        .first(conn)
        .optional()?;
    member.ok_or_else(AppError::not_found)
}

fn member_to_response(user: User) -> MemberResponse {
    MemberResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        is_active: user.is_active,
        joined_at: to_iso(user.created_at),
    }
}
