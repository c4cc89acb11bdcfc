use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::models::NewActivityLog;
use crate::schema::activity_logs;

pub const ACTION_WORKSPACE_UPDATED: &str = "workspace.updated";
pub const ACTION_WORKSPACE_DELETED: &str = "workspace.deleted";
pub const ACTION_MEMBER_REMOVED: &str = "member.removed";
pub const ACTION_MEMBER_ROLE_CHANGED: &str = "member.role_changed";
pub const ACTION_INVITE_CREATED: &str = "invite.created";
pub const ACTION_INVITE_REVOKED: &str = "invite.revoked";
pub const ACTION_INVITE_ACCEPTED: &str = "invite.accepted";
pub const ACTION_SETTINGS_UPDATED: &str = "settings.updated";
pub const ACTION_SETTINGS_CLEARED: &str = "settings.cleared";
pub const ACTION_POST_CREATED: &str = "post.created";
pub const ACTION_POST_UPDATED: &str = "post.updated";
pub const ACTION_POST_DELETED: &str = "post.deleted";

/// Appends an audit row. Callers run this inside the same transaction as the
/// primary write so the trail never diverges from the data it describes.
pub fn record_activity(
    conn: &mut PgConnection,
    workspace_id: Uuid,
    user_id: Option<Uuid>,
    action: &str,
    resource_type: &str,
    resource_id: Option<Uuid>,
    details: Value,
) -> QueryResult<()> {
    let entry = NewActivityLog {
        id: Uuid::new_v4(),
        workspace_id,
        user_id,
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id,
        details,
    };

    diesel::insert_into(activity_logs::table)
        .values(&entry)
        .execute(conn)?;
    Ok(())
}
