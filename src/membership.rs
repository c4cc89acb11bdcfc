use chrono::NaiveDateTime;
use diesel::pg::PgConnection;
use diesel::{dsl::count_star, prelude::*};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{User, WorkspaceInvite};
use crate::schema::users;

pub const INVITE_PENDING: &str = "pending";
pub const INVITE_ACCEPTED: &str = "accepted";
pub const INVITE_REVOKED: &str = "revoked";

/// Workspace roles, statically validated at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }
}

/// Loads the caller's user row and checks they are an active member of the
/// given workspace. Non-members get a 403, never a 404, so outsiders cannot
/// probe workspace existence.
pub fn resolve_member(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> AppResult<User> {
    let user: Option<User> = users::table
        .find(user_id)
        .filter(users::is_active.eq(true))
        .first(conn)
        .optional()?;

    match user {
        Some(user) if user.workspace_id == Some(workspace_id) => Ok(user),
        _ => Err(AppError::forbidden("not a member of this workspace")),
    }
}

/// As `resolve_member`, but additionally requires the admin role.
pub fn resolve_admin(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Uuid,
) -> AppResult<User> {
    let user = resolve_member(conn, workspace_id, user_id)?;
    if user.role != Role::Admin.as_str() {
        return Err(AppError::forbidden("admin role required"));
    }
    Ok(user)
}

pub fn active_member_count(conn: &mut PgConnection, workspace_id: Uuid) -> QueryResult<i64> {
    users::table
        .filter(users::workspace_id.eq(workspace_id))
        .filter(users::is_active.eq(true))
        .select(count_star())
        .first(conn)
}

pub fn admin_count(conn: &mut PgConnection, workspace_id: Uuid) -> QueryResult<i64> {
    users::table
        .filter(users::workspace_id.eq(workspace_id))
        .filter(users::is_active.eq(true))
        .filter(users::role.eq(Role::Admin.as_str()))
        .select(count_star())
        .first(conn)
}

/// Expiry is evaluated lazily against the stored timestamp; no background
/// process transitions invites.
pub fn invite_is_expired(invite: &WorkspaceInvite, now: NaiveDateTime) -> bool {
    invite.expires_at <= now
}

pub fn invite_is_valid(invite: &WorkspaceInvite, now: NaiveDateTime) -> bool {
    invite.status == INVITE_PENDING && !invite_is_expired(invite, now)
}

/// URL-safe single-use token, 64 hex characters.
pub fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;

    fn invite(status: &str, expires_in: Duration) -> WorkspaceInvite {
        let now = Utc::now().naive_utc();
        WorkspaceInvite {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            email: None,
            role: "editor".to_string(),
            token: generate_invite_token(),
            status: status.to_string(),
            expires_at: now + expires_in,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn pending_invite_within_expiry_is_valid() {
        let invite = invite(INVITE_PENDING, Duration::days(7));
        assert!(invite_is_valid(&invite, Utc::now().naive_utc()));
    }

    #[test]
    fn pending_invite_is_invalid_after_expiry() {
        let invite = invite(INVITE_PENDING, Duration::days(7));
        let later = Utc::now().naive_utc() + Duration::days(8);
        assert!(!invite_is_valid(&invite, later));
    }

    #[test]
    fn accepted_and_revoked_invites_are_never_valid() {
        let now = Utc::now().naive_utc();
        assert!(!invite_is_valid(&invite(INVITE_ACCEPTED, Duration::days(7)), now));
        assert!(!invite_is_valid(&invite(INVITE_REVOKED, Duration::days(7)), now));
    }

    #[test]
    fn invite_tokens_are_url_safe_and_unique() {
        let a = generate_invite_token();
        let b = generate_invite_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
