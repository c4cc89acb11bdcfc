mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_vec, TestApp};
use serde::Deserialize;
use serde_json::json;

#[tokio::test]
async fn twitter_post_validation_and_missing_credentials() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Acme", 5).await?;
    app.insert_user("editor@acme.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    let token = app.login_token("editor@acme.test", "editorpass").await?;

    // Empty text is rejected before anything else happens.
    let empty = app
        .post_json(
            "/api/platforms/twitter/post",
            &json!({ "text": "   " }),
            Some(&token),
        )
        .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    // So is text over the character limit; the limit counts characters,
    // not bytes.
    let long = "ü".repeat(281);
    let too_long = app
        .post_json(
            "/api/platforms/twitter/post",
            &json!({ "text": long }),
            Some(&token),
        )
        .await?;
    assert_eq!(too_long.status(), StatusCode::BAD_REQUEST);

    // Malformed media is caught before credentials or the network come
    // into play.
    let bad_media = app
        .post_json(
            "/api/platforms/twitter/post",
            &json!({
                "text": "hello",
                "media": [{ "data": "not valid base64!!!", "mimeType": "image/png" }]
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(bad_media.status(), StatusCode::BAD_REQUEST);

    // A valid tweet still fails with a domain error when the caller has no
    // stored credentials.
    let no_credentials = app
        .post_json(
            "/api/platforms/twitter/post",
            &json!({ "text": "hello world" }),
            Some(&token),
        )
        .await?;
    assert_eq!(no_credentials.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn browser_tools_empty_without_webdriver() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Acme", 5).await?;
    app.insert_user("editor@acme.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    let token = app.login_token("editor@acme.test", "editorpass").await?;

    #[derive(Deserialize)]
    struct ToolsBody {
        tools: Vec<serde_json::Value>,
    }

    // No WebDriver configured in tests, so discovery degrades to an empty
    // list instead of failing.
    let response = app.get("/api/platforms/browser/tools", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: ToolsBody = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert!(body.tools.is_empty());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn voice_persona_reflects_configuration() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let workspace_id = app.insert_workspace("Acme", 5).await?;
    app.insert_user("editor@acme.test", "editorpass", "editor", Some(workspace_id))
        .await?;
    let token = app.login_token("editor@acme.test", "editorpass").await?;

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct PersonaBody {
        name: String,
        voice: String,
        instructions: String,
        temperature: f64,
        greeting: String,
    }

    let response = app.get("/api/platforms/voice/persona", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let persona: PersonaBody = serde_json::from_slice(&body_to_vec(response.into_body()).await?)?;
    assert_eq!(persona.name, "Riley");
    assert_eq!(persona.voice, "alloy");
    assert!((persona.temperature - 0.7).abs() < f64::EPSILON);
    assert!(persona.instructions.contains("Riley"));
    assert!(persona.greeting.contains("Riley"));

    app.cleanup().await?;
    Ok(())
}
