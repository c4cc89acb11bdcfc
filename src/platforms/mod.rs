pub mod browser;
pub mod twitter;
pub mod voice;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::PlatformCredential;
use crate::schema::platform_credentials;

/// Looks up the caller's stored credential row for a platform. Adapters share
/// nothing else with the workspace services.
pub fn load_credentials(
    conn: &mut PgConnection,
    user_id: Uuid,
    platform: &str,
) -> AppResult<PlatformCredential> {
    platform_credentials::table
        .filter(platform_credentials::user_id.eq(user_id))
        .filter(platform_credentials::platform.eq(platform))
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::bad_request(format!("no {platform} credentials on file")))
}
