mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostBody {
    id: Uuid,
    topic: String,
    platforms: Vec<String>,
    post_type: String,
    status: String,
    text: Option<String>,
    image_url: Option<String>,
    carousel_images: Option<Vec<String>>,
}

#[tokio::test]
async fn post_content_merge_and_type_flow() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Brand", 5).await?;
    app.insert_user("editor@brand.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    let token = app.login_token("editor@brand.test", "editorpass").await?;

    let created = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/posts"),
            &json!({
                "topic": "Spring launch",
                "platforms": ["twitter"],
                "text": "We are live!",
                "imageUrl": "https://cdn.test/launch.png",
                "ignoredField": "dropped"
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let post: PostBody = serde_json::from_slice(&body_to_vec(created.into_body()).await?)?;
    assert_eq!(post.topic, "Spring launch");
    assert_eq!(post.platforms, vec!["twitter"]);
    assert_eq!(post.post_type, "post");
    assert_eq!(post.status, "draft");
    assert_eq!(post.text.as_deref(), Some("We are live!"));
    assert_eq!(post.image_url.as_deref(), Some("https://cdn.test/launch.png"));

    // Unknown content keys never make it into the stored blob.
    let fetched = app
        .get(
            &format!("/api/workspaces/{workspace_id}/posts/{}", post.id),
            Some(&token),
        )
        .await?;
    let raw: serde_json::Value = serde_json::from_slice(&body_to_vec(fetched.into_body()).await?)?;
    assert!(raw.get("ignoredField").is_none());

    // Adding carousel images flips the type to carousel even though the
    // caller asked for something else.
    let updated = app
        .patch_json(
            &format!("/api/workspaces/{workspace_id}/posts/{}", post.id),
            &json!({
                "postType": "reel",
                "carouselImages": ["https://cdn.test/1.png", "https://cdn.test/2.png"]
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated: PostBody = serde_json::from_slice(&body_to_vec(updated.into_body()).await?)?;
    assert_eq!(updated.post_type, "carousel");
    // The earlier fields survive a partial update.
    assert_eq!(updated.text.as_deref(), Some("We are live!"));
    assert_eq!(updated.carousel_images.as_ref().map(Vec::len), Some(2));

    // A text-only touch keeps both the carousel type and its images.
    let touched = app
        .patch_json(
            &format!("/api/workspaces/{workspace_id}/posts/{}", post.id),
            &json!({ "text": "Updated copy" }),
            Some(&token),
        )
        .await?;
    assert_eq!(touched.status(), StatusCode::OK);
    let touched: PostBody = serde_json::from_slice(&body_to_vec(touched.into_body()).await?)?;
    assert_eq!(touched.post_type, "carousel");
    assert_eq!(touched.text.as_deref(), Some("Updated copy"));
    assert_eq!(touched.carousel_images.as_ref().map(Vec::len), Some(2));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn client_supplied_post_ids_cannot_collide() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Brand", 5).await?;
    app.insert_user("editor@brand.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    let token = app.login_token("editor@brand.test", "editorpass").await?;

    let post_id = Uuid::new_v4();
    let created = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/posts"),
            &json!({ "id": post_id, "topic": "offline draft", "text": "hi" }),
            Some(&token),
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: PostBody = serde_json::from_slice(&body_to_vec(created.into_body()).await?)?;
    assert_eq!(created.id, post_id);

    // Reusing the id is a conflict, not a server error.
    let duplicate = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/posts"),
            &json!({ "id": post_id, "topic": "retry", "text": "again" }),
            Some(&token),
        )
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn post_listing_and_access_control() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Brand", 5).await?;
    app.insert_user("editor@brand.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    app.insert_user("outsider@other.test", "outsiderpass", "admin", None)
        .await?;

    let token = app.login_token("editor@brand.test", "editorpass").await?;
    let outsider_token = app.login_token("outsider@other.test", "outsiderpass").await?;

    for topic in ["first", "second", "third"] {
        let created = app
            .post_json(
                &format!("/api/workspaces/{workspace_id}/posts"),
                &json!({ "topic": topic, "text": topic }),
                Some(&token),
            )
            .await?;
        assert_eq!(created.status(), StatusCode::CREATED);
    }

    // Creating with carousel images classifies the post up front.
    let carousel = app
        .post_json(
            &format!("/api/workspaces/{workspace_id}/posts"),
            &json!({
                "topic": "gallery",
                "carouselImages": ["https://cdn.test/a.png"]
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(carousel.status(), StatusCode::CREATED);
    let carousel: PostBody = serde_json::from_slice(&body_to_vec(carousel.into_body()).await?)?;
    assert_eq!(carousel.post_type, "carousel");

    // Newest first.
    let listed = app
        .get(&format!("/api/workspaces/{workspace_id}/posts"), Some(&token))
        .await?;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed: Vec<PostBody> = serde_json::from_slice(&body_to_vec(listed.into_body()).await?)?;
    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].topic, "gallery");

    // Non-members cannot see or touch the workspace's posts.
    let forbidden = app
        .get(
            &format!("/api/workspaces/{workspace_id}/posts"),
            Some(&outsider_token),
        )
        .await?;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .delete(
            &format!("/api/workspaces/{workspace_id}/posts/{}", carousel.id),
            Some(&token),
        )
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app
        .get(
            &format!("/api/workspaces/{workspace_id}/posts/{}", carousel.id),
            Some(&token),
        )
        .await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}
