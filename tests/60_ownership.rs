mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn foreign_skills_look_missing() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    let skill = server.skill(&alice, "Rust", "backend").await?;
    let path = format!("/api/skills/{}", skill["id"]);

    let foreign = server.authed(&bob, Method::GET, &path).send().await?;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    let foreign: Value = foreign.json().await?;

    let missing = server.authed(&bob, Method::GET, "/api/skills/999999").send().await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let missing: Value = missing.json().await?;
    assert_eq!(foreign, missing);

    let res = server.authed(&bob, Method::PATCH, &path).json(&json!({"name": "Stolen"})).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server.authed(&bob, Method::DELETE, &path).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let still_there = server.get_json(&alice, &path).await?;
    assert_eq!(still_there["name"], "Rust");

    let bobs = server.get_json(&bob, "/api/skills").await?;
    assert_eq!(bobs, json!([]));
    Ok(())
}

#[tokio::test]
async fn foreign_projects_and_milestones_look_missing() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    let project = server.project(&alice, json!({"title": "Secret", "milestones": [{"title": "m"}]})).await?;
    let path = format!("/api/projects/{}", project["id"]);
    let toggle = format!("{}/milestones/{}", path, project["milestones"][0]["id"]);

    for method in [Method::GET, Method::DELETE] {
        let res = server.authed(&bob, method, &path).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
    let res = server.authed(&bob, Method::PUT, &path).json(&json!({"title": "Mine"})).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.authed(&bob, Method::PATCH, &toggle).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let unchanged = server.get_json(&alice, &path).await?;
    assert_eq!(unchanged["title"], "Secret");
    assert_eq!(unchanged["milestones"][0]["completed"], false);
    Ok(())
}

#[tokio::test]
async fn projects_cannot_link_foreign_skills() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    let skill = server.skill(&alice, "Rust", "backend").await?;

    let res = server
        .authed(&bob, Method::POST, "/api/projects")
        .json(&json!({"title": "Borrowed", "skills": [skill["id"]]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["skills"].is_string());
    Ok(())
}

#[tokio::test]
async fn foreign_notifications_look_missing() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    server.skill(&alice, "Rust", "backend").await?;
    let list = server.get_json(&alice, "/api/notifications").await?;
    let id = list[0]["id"].as_i64().unwrap_or_default();

    let res = server
        .authed(&bob, Method::PATCH, &format!("/api/notifications/{}/read", id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = server
        .authed(&bob, Method::DELETE, &format!("/api/notifications/{}", id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Bulk operations only touch the caller's rows
    server.authed(&bob, Method::POST, "/api/notifications/mark-all-read").send().await?;
    server.authed(&bob, Method::DELETE, "/api/notifications").send().await?;

    let count = server.get_json(&alice, "/api/notifications/unread-count").await?;
    assert_eq!(count["unread"], 1);
    Ok(())
}

#[tokio::test]
async fn dashboards_are_per_user() -> Result<()> {
    let server = TestServer::start().await?;
    let alice = server.user("alice@example.com").await?;
    let bob = server.user("bob@example.com").await?;

    server.skill(&alice, "Rust", "backend").await?;
    server.project(&alice, json!({"title": "Mine", "status": "completed"})).await?;

    let stats = server.get_json(&bob, "/api/dashboard/stats").await?;
    assert_eq!(stats, json!({"total_skills": 0, "total_projects": 0, "completed_projects": 0}));
    let feed = server.get_json(&bob, "/api/dashboard/activity").await?;
    assert_eq!(feed, json!([]));
    Ok(())
}
