use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use diesel::{dsl::exists, prelude::*, select};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{
    record_activity, ACTION_INVITE_ACCEPTED, ACTION_INVITE_CREATED, ACTION_INVITE_REVOKED,
};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::membership::{
    active_member_count, generate_invite_token, invite_is_expired, invite_is_valid,
    resolve_admin, Role, INVITE_ACCEPTED, INVITE_PENDING, INVITE_REVOKED,
};
use crate::models::{NewWorkspaceInvite, Workspace, WorkspaceInvite};
use crate::schema::{users, workspace_invites, workspaces};
use crate::state::AppState;

use super::workspaces::{load_active_workspace, to_iso};

const DEFAULT_INVITE_EXPIRY_DAYS: i64 = 7;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub email: Option<String>,
    pub role: Role,
    pub expires_in_days: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub token: String,
    pub status: String,
    pub is_valid: bool,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInviteResponse {
    pub workspace_name: String,
    pub email: Option<String>,
    pub role: String,
    pub status: String,
    pub is_valid: bool,
    pub expires_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptInviteResponse {
    pub workspace_id: Uuid,
    pub role: String,
}

pub async fn list_invites(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<InviteResponse>>> {
    let mut conn = state.db()?;
    resolve_admin(&mut conn, workspace_id, user.user_id)?;

    let invites: Vec<WorkspaceInvite> = workspace_invites::table
        .filter(workspace_invites::workspace_id.eq(workspace_id))
        .order(workspace_invites::created_at.desc())
        .load(&mut conn)?;

    let now = Utc::now().naive_utc();
    Ok(Json(
        invites
            .into_iter()
            .map(|invite| invite_to_response(invite, now))
            .collect(),
    ))
}

pub async fn create_invite(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateInviteRequest>,
) -> AppResult<(StatusCode, Json<InviteResponse>)> {
    let expires_in_days = payload.expires_in_days.unwrap_or(DEFAULT_INVITE_EXPIRY_DAYS);
    if expires_in_days < 1 {
        return Err(AppError::bad_request("expiresInDays must be at least 1"));
    }

    let email = match payload.email {
        Some(ref raw) => {
            let trimmed = raw.trim().to_lowercase();
            if trimmed.is_empty() || !trimmed.contains('@') {
                return Err(AppError::bad_request("email is not valid"));
            }
            Some(trimmed)
        }
        None => None,
    };

    let mut conn = state.db()?;

    let invite = conn.transaction::<WorkspaceInvite, AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;
        let workspace = load_active_workspace(conn, workspace_id)?;

        let members = active_member_count(conn, workspace_id)?;
        if members >= i64::from(workspace.max_users) {
            return Err(AppError::bad_request("workspace member limit reached"));
        }

        if let Some(ref email) = email {
            let already_member: bool = select(exists(
                users::table
                    .filter(users::workspace_id.eq(workspace_id))
                    .filter(users::is_active.eq(true))
                    .filter(users::email.eq(email)),
            ))
            .get_result(conn)?;
            if already_member {
                return Err(AppError::bad_request("user is already a member"));
            }

            let now = Utc::now().naive_utc();
            let pending: bool = select(exists(
                workspace_invites::table
                    .filter(workspace_invites::workspace_id.eq(workspace_id))
                    .filter(workspace_invites::email.eq(email))
                    .filter(workspace_invites::status.eq(INVITE_PENDING))
                    .filter(workspace_invites::expires_at.gt(now)),
            ))
            .get_result(conn)?;
            if pending {
                return Err(AppError::bad_request(
                    "a pending invite already exists for this email",
                ));
            }
        }

        let now = Utc::now();
        let new_invite = NewWorkspaceInvite {
            id: Uuid::new_v4(),
            workspace_id,
            email: email.clone(),
            role: payload.role.as_str().to_string(),
            token: generate_invite_token(),
            status: INVITE_PENDING.to_string(),
            expires_at: (now + ChronoDuration::days(expires_in_days)).naive_utc(),
            created_by: Some(user.user_id),
        };

        diesel::insert_into(workspace_invites::table)
            .values(&new_invite)
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_INVITE_CREATED,
            "invite",
            Some(new_invite.id),
            json!({ "email": email, "role": payload.role.as_str() }),
        )?;

        Ok(workspace_invites::table.find(new_invite.id).first(conn)?)
    })?;

    let now = Utc::now().naive_utc();
    Ok((StatusCode::CREATED, Json(invite_to_response(invite, now))))
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    Path((workspace_id, invite_id)): Path<(Uuid, Uuid)>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;

        let invite: WorkspaceInvite = workspace_invites::table
            .find(invite_id)
            .filter(workspace_invites::workspace_id.eq(workspace_id))
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        if invite.status == INVITE_ACCEPTED {
            return Err(AppError::bad_request("invite has already been accepted"));
        }

        let now = Utc::now().naive_utc();
        diesel::update(workspace_invites::table.find(invite_id))
            .set((
                workspace_invites::status.eq(INVITE_REVOKED),
                workspace_invites::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_INVITE_REVOKED,
            "invite",
            Some(invite_id),
            json!({ "email": invite.email }),
        )?;

        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Public lookup for the invite landing page; no authentication required.
pub async fn get_invite_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<PublicInviteResponse>> {
    let mut conn = state.db()?;

    let invite: WorkspaceInvite = workspace_invites::table
        .filter(workspace_invites::token.eq(&token))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let workspace: Workspace = workspaces::table
        .find(invite.workspace_id)
        .first(&mut conn)?;

    let now = Utc::now().naive_utc();
    let is_valid = invite_is_valid(&invite, now) && workspace.deleted_at.is_none();

    Ok(Json(PublicInviteResponse {
        workspace_name: workspace.name,
        email: invite.email.clone(),
        role: invite.role.clone(),
        status: invite.status.clone(),
        is_valid,
        expires_at: to_iso(invite.expires_at),
    }))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
    user: AuthenticatedUser,
) -> AppResult<Json<AcceptInviteResponse>> {
    let mut conn = state.db()?;

    let (workspace_id, role) = conn.transaction::<(Uuid, String), AppError, _>(|conn| {
        let invite: WorkspaceInvite = workspace_invites::table
            .filter(workspace_invites::token.eq(&token))
            .first(conn)
            .optional()?
            .ok_or_else(AppError::not_found)?;

        let now = Utc::now().naive_utc();
        if invite.status != INVITE_PENDING {
            return Err(AppError::bad_request("invite is no longer valid"));
        }
        if invite_is_expired(&invite, now) {
            return Err(AppError::bad_request("invite has expired"));
        }

        if let Some(ref invited_email) = invite.email {
            if !invited_email.eq_ignore_ascii_case(&user.email) {
                return Err(AppError::forbidden(
                    "invite was issued for a different email address",
                ));
            }
        }

        let workspace = load_active_workspace(conn, invite.workspace_id)
            .map_err(|_| AppError::bad_request("workspace is no longer available"))?;

        let members = active_member_count(conn, workspace.id)?;
        if members >= i64::from(workspace.max_users) {
            return Err(AppError::bad_request("workspace member limit reached"));
        }

        // Joining overwrites any previous workspace attachment.
        diesel::update(users::table.find(user.user_id))
            .set((
                users::workspace_id.eq(Some(workspace.id)),
                users::role.eq(&invite.role),
                users::updated_at.eq(now),
            ))
            .execute(conn)?;

        diesel::update(workspace_invites::table.find(invite.id))
            .set((
                workspace_invites::status.eq(INVITE_ACCEPTED),
                workspace_invites::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace.id,
            Some(user.user_id),
            ACTION_INVITE_ACCEPTED,
            "invite",
            Some(invite.id),
            json!({ "email": user.email }),
        )?;

        Ok((workspace.id, invite.role))
    })?;

    Ok(Json(AcceptInviteResponse { workspace_id, role }))
}

fn invite_to_response(invite: WorkspaceInvite, now: chrono::NaiveDateTime) -> InviteResponse {
    let is_valid = invite_is_valid(&invite, now);
    InviteResponse {
        id: invite.id,
        workspace_id: invite.workspace_id,
        email: invite.email,
        role: invite.role,
        token: invite.token,
        status: invite.status,
        is_valid,
        expires_at: to_iso(invite.expires_at),
        created_at: to_iso(invite.created_at),
    }
}
