mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use common::{TestServer, TestUser};

async fn unread(server: &TestServer, user: &TestUser) -> Result<i64> {
    let body = server.get_json(user, "/api/notifications/unread-count").await?;
    Ok(body["unread"].as_i64().unwrap_or(-1))
}

#[tokio::test]
async fn creating_resources_notifies_the_owner() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("notify@example.com").await?;

    server.skill(&user, "Python", "backend").await?;
    server.project(&user, json!({"title": "Blog"})).await?;

    let list = server.get_json(&user, "/api/notifications").await?;
    let items = list.as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "New Project Created");
    assert_eq!(items[0]["message"], "Project 'Blog' was created");
    assert_eq!(items[0]["is_read"], false);
    assert_eq!(items[1]["title"], "New Skill Added");
    assert_eq!(items[1]["message"], "You added Python");
    assert_eq!(unread(&server, &user).await?, 2);
    Ok(())
}

#[tokio::test]
async fn updates_and_deletes_do_not_notify() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("quiet@example.com").await?;

    let skill = server.skill(&user, "Go", "backend").await?;
    let project = server
        .project(&user, json!({"title": "Blog", "milestones": [{"title": "Draft"}]}))
        .await?;
    assert_eq!(unread(&server, &user).await?, 2);

    let skill_path = format!("/api/skills/{}", skill["id"]);
    let project_path = format!("/api/projects/{}", project["id"]);
    let toggle_path = format!("{}/milestones/{}", project_path, project["milestones"][0]["id"]);

    let steps = [
        (Method::PATCH, skill_path.clone(), Some(json!({"name": "Golang"}))),
        (
            Method::PUT,
            skill_path.clone(),
            Some(json!({"name": "Go", "category": "backend", "proficiency": "advanced"})),
        ),
        (Method::PATCH, project_path.clone(), Some(json!({"status": "in_progress"}))),
        (Method::PATCH, toggle_path, None),
        (
            Method::PUT,
            project_path.clone(),
            Some(json!({"title": "Blog v2", "milestones": [{"title": "Publish"}]})),
        ),
        (Method::DELETE, skill_path, None),
        (Method::DELETE, project_path, None),
    ];

    for (method, path, body) in steps {
        let mut req = server.authed(&user, method.clone(), &path);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        assert!(res.status().is_success(), "{} {} -> {}", method, path, res.status());
    }

    assert_eq!(unread(&server, &user).await?, 2);
    let list = server.get_json(&user, "/api/notifications").await?;
    assert_eq!(list.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn failed_creates_do_not_notify() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("failed@example.com").await?;

    let res = server
        .authed(&user, Method::POST, "/api/projects")
        .json(&json!({"title": "Broken", "skills": [12345]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(unread(&server, &user).await?, 0);
    Ok(())
}

#[tokio::test]
async fn read_state_and_removal() -> Result<()> {
    let server = TestServer::start().await?;
    let user = server.user("reader@example.com").await?;

    for name in ["A", "B", "C"] {
        server.skill(&user, name, "other").await?;
    }
    let list = server.get_json(&user, "/api/notifications").await?;
    let first = list[0]["id"].as_i64().unwrap_or_default();

    let res = server
        .authed(&user, Method::PATCH, &format!("/api/notifications/{}/read", first))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "read");
    assert_eq!(unread(&server, &user).await?, 2);

    let res = server.authed(&user, Method::POST, "/api/notifications/mark-all-read").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "all read");
    assert_eq!(unread(&server, &user).await?, 0);

    let res = server
        .authed(&user, Method::DELETE, &format!("/api/notifications/{}", first))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let list = server.get_json(&user, "/api/notifications").await?;
    assert_eq!(list.as_array().map(Vec::len), Some(2));

    let res = server.authed(&user, Method::DELETE, "/api/notifications").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "cleared");
    let list = server.get_json(&user, "/api/notifications").await?;
    assert_eq!(list, json!([]));
    Ok(())
}
