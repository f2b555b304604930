#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::Request;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use axum::ServiceExt;

use skillsync_api::app::{self, AppState};
use skillsync_api::auth::TokenService;
use skillsync_api::config::AppConfig;
use skillsync_api::store::{MemoryStore, Store};

pub const PASSWORD: &str = "s3cure-enough";

/// One in-process server per test, backed by a fresh in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
}

/// A registered and logged-in account.
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let config = AppConfig::default();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&config.security)?;
        let service = app::service(AppState::new(store, tokens), &config);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, ServiceExt::<Request>::into_make_service(service)).await
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Request carrying `user`'s access token.
    pub fn authed(&self, user: &TestUser, method: Method, path: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(&user.access)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .request(Method::POST, "/api/auth/register")
            .json(&json!({"email": email, "name": "Test User", "password": password, "password2": password}))
            .send()
            .await?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .request(Method::POST, "/api/auth/login")
            .json(&json!({"email": email, "password": password}))
            .send()
            .await?)
    }

    /// Register `email` and log in.
    pub async fn user(&self, email: &str) -> Result<TestUser> {
        let res = self.register(email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.login(email, PASSWORD).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;

        Ok(TestUser {
            id: body["user"]["id"].as_i64().context("login response missing user id")?,
            email: email.to_string(),
            access: body["access"].as_str().context("missing access token")?.to_string(),
            refresh: body["refresh"].as_str().context("missing refresh token")?.to_string(),
        })
    }

    /// Authenticated JSON POST; expects 201.
    pub async fn create(&self, user: &TestUser, path: &str, body: Value) -> Result<Value> {
        let res = self.authed(user, Method::POST, path).json(&body).send().await?;
        let status = res.status();
        let body: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} failed with {}: {}", path, status, body);
        Ok(body)
    }

    /// Authenticated GET; expects 200.
    pub async fn get_json(&self, user: &TestUser, path: &str) -> Result<Value> {
        let res = self.authed(user, Method::GET, path).send().await?;
        let status = res.status();
        let body: Value = res.json().await?;
        anyhow::ensure!(status == StatusCode::OK, "GET {} failed with {}: {}", path, status, body);
        Ok(body)
    }

    pub async fn skill(&self, user: &TestUser, name: &str, category: &str) -> Result<Value> {
        self.create(
            user,
            "/api/skills",
            json!({"name": name, "category": category, "proficiency": "intermediate", "years_of_experience": 2}),
        )
        .await
    }

    pub async fn project(&self, user: &TestUser, body: Value) -> Result<Value> {
        self.create(user, "/api/projects", body).await
    }
}
