mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::{TestServer, PASSWORD};

#[tokio::test]
async fn me_returns_and_updates_profile() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("me@example.com").await?;

    let me = server.get_json(&user, "/api/users/me").await?;
    assert_eq!(me["email"], "me@example.com");
    assert_eq!(me["name"], "Test User");
    assert_eq!(me["avatar"], Value::Null);
    assert!(me.get("password_hash").is_none());

    let res = server
        .authed(&user, Method::PATCH, "/api/users/me")
        .json(&json!({"name": "Renamed", "avatar": "https://example.com/a.png", "email": "ignored@example.com"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["avatar"], "https://example.com/a.png");
    assert_eq!(updated["email"], "me@example.com");

    // The alias route serves the same profile
    let alias = server.get_json(&user, "/api/auth/me").await?;
    assert_eq!(alias, updated);

    let res = server
        .authed(&user, Method::PUT, "/api/users/me")
        .json(&json!({"avatar": null}))
        .send()
        .await?;
    let cleared: Value = res.json().await?;
    assert_eq!(cleared["avatar"], Value::Null);
    assert_eq!(cleared["name"], "Renamed");
    Ok(())
}

#[tokio::test]
async fn change_password_requires_old_password() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("pw@example.com").await?;

    let res = server
        .authed(&user, Method::POST, "/api/users/change-password")
        .json(&json!({"old_password": "not-it", "new_password": "brand-new-secret"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["field_errors"]["old_password"], "Wrong password");

    let res = server
        .authed(&user, Method::POST, "/api/users/change-password")
        .json(&json!({"old_password": PASSWORD, "new_password": "short"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["new_password"].is_string());

    let res = server
        .authed(&user, Method::POST, "/api/users/change-password")
        .json(&json!({"old_password": PASSWORD, "new_password": "brand-new-secret"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["detail"], "Password updated successfully");

    let old = server.login(&user.email, PASSWORD).await?;
    assert_eq!(old.status(), StatusCode::BAD_REQUEST);
    let new = server.login(&user.email, "brand-new-secret").await?;
    assert_eq!(new.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn deleting_account_revokes_access() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("gone@example.com").await?;
    server.skill(&user, "Rust", "backend").await?;

    let res = server.authed(&user, Method::DELETE, "/api/users/me").send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The token is still well-formed, but its user no longer exists
    let res = server.authed(&user, Method::GET, "/api/users/me").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.login(&user.email, PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The address is free again
    let res = server.register(&user.email, PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}
