use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::activity::{record_activity, ACTION_SETTINGS_CLEARED, ACTION_SETTINGS_UPDATED};
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::membership::{resolve_admin, resolve_member};
use crate::models::{BusinessSettings, NewBusinessSettings};
use crate::schema::business_settings;
use crate::state::AppState;

use super::workspaces::{load_active_workspace, to_iso};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertSettingsRequest {
    pub business_name: String,
    pub industry: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub brand_colors: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub workspace_id: Uuid,
    pub business_name: String,
    pub industry: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub website: Option<String>,
    pub brand_colors: Value,
    pub updated_at: String,
}

pub async fn get_settings(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<SettingsResponse>> {
    let mut conn = state.db()?;
    resolve_member(&mut conn, workspace_id, user.user_id)?;

    let settings: BusinessSettings = business_settings::table
        .find(workspace_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(settings_to_response(settings)))
}

/// Upsert keyed by workspace id; one row per workspace, no history.
pub async fn upsert_settings(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<UpsertSettingsRequest>,
) -> AppResult<Json<SettingsResponse>> {
    let business_name = payload.business_name.trim().to_string();
    if business_name.is_empty() {
        return Err(AppError::bad_request("businessName must not be empty"));
    }
    let brand_colors = payload.brand_colors.unwrap_or_else(|| json!({}));

    let mut conn = state.db()?;

    let saved = conn.transaction::<BusinessSettings, AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;
        load_active_workspace(conn, workspace_id)?;

        let row = NewBusinessSettings {
            workspace_id,
            business_name: business_name.clone(),
            industry: payload.industry.clone(),
            contact_email: payload.contact_email.clone(),
            contact_phone: payload.contact_phone.clone(),
            website: payload.website.clone(),
            brand_colors: brand_colors.clone(),
        };

        let now = Utc::now().naive_utc();
        diesel::insert_into(business_settings::table)
            .values(&row)
            .on_conflict(business_settings::workspace_id)
            .do_update()
            .set((
                business_settings::business_name.eq(&business_name),
                business_settings::industry.eq(&payload.industry),
                business_settings::contact_email.eq(&payload.contact_email),
                business_settings::contact_phone.eq(&payload.contact_phone),
                business_settings::website.eq(&payload.website),
                business_settings::brand_colors.eq(&brand_colors),
                business_settings::updated_at.eq(now),
            ))
            .execute(conn)?;

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_SETTINGS_UPDATED,
            "settings",
            Some(workspace_id),
            json!({ "businessName": business_name }),
        )?;

        Ok(business_settings::table.find(workspace_id).first(conn)?)
    })?;

    Ok(Json(settings_to_response(saved)))
}

pub async fn clear_settings(
    State(state): State<AppState>,
    Path(workspace_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        resolve_admin(conn, workspace_id, user.user_id)?;

        let deleted = diesel::delete(business_settings::table.find(workspace_id))
            .execute(conn)?;
        if deleted == 0 {
            return Err(AppError::not_found());
        }

        record_activity(
            conn,
            workspace_id,
            Some(user.user_id),
            ACTION_SETTINGS_CLEARED,
            "settings",
            Some(workspace_id),
            json!({}),
        )?;

        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn settings_to_response(settings: BusinessSettings) -> SettingsResponse {
    SettingsResponse {
        workspace_id: settings.workspace_id,
        business_name: settings.business_name,
        industry: settings.industry,
        contact_email: settings.contact_email,
        contact_phone: settings.contact_phone,
        website: settings.website,
        brand_colors: settings.brand_colors,
        updated_at: to_iso(settings.updated_at),
    }
}
