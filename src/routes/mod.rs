use axum::http::HeaderValue;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::{auth::AuthenticatedUser, state::AppState};

pub mod activity;
pub mod auth;
pub mod health;
pub mod invites;
pub mod members;
pub mod platforms;
pub mod posts;
pub mod settings;
pub mod workspaces;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let workspaces_routes = Router::new()
        .route(
            "/:id",
            get(workspaces::get_workspace)
                .patch(workspaces::update_workspace)
                .delete(workspaces::delete_workspace),
        )
        .route("/:id/members", get(members::list_members))
        .route("/:id/members/:user_id", delete(members::remove_member))
        .route(
            "/:id/members/:user_id/role",
            patch(members::update_member_role),
        )
        .route(
            "/:id/invites",
            get(invites::list_invites).post(invites::create_invite),
        )
        .route("/:id/invites/:invite_id", delete(invites::revoke_invite))
        .route("/:id/activity", get(activity::list_activity))
        .route(
            "/:id/settings",
            get(settings::get_settings)
                .put(settings::upsert_settings)
                .delete(settings::clear_settings),
        )
        .route("/:id/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/:id/posts/:post_id",
            get(posts::get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        );

    let platforms_routes = Router::new()
        .route("/twitter/post", post(platforms::post_to_twitter))
        .route("/browser/tools", get(platforms::browser_tools))
        .route("/voice/persona", get(platforms::voice_persona));

    let invite_accept_routes =
        Router::new().route("/:token/accept", post(invites::accept_invite));

    let public_invite_routes =
        Router::new().route("/:token", get(invites::get_invite_by_token));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/workspaces", workspaces_routes)
        .nest("/api/platforms", platforms_routes)
        .nest("/api/invites", invite_accept_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/invites", public_invite_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
