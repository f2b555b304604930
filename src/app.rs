use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, validate_user_middleware};
use crate::observer::{NotificationTrigger, ObserverPipeline};
use crate::store::Store;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenService,
    pub observers: ObserverPipeline,
}

impl AppState {
    /// State with the notification trigger registered against `store`.
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        let mut observers = ObserverPipeline::new();
        observers.register_observer(Arc::new(NotificationTrigger::new(store.clone())));
        Self {
            store,
            tokens,
            observers,
        }
    }
}

/// The full HTTP service: routes plus trailing-slash normalisation, which has
/// to run before routing.
pub fn service(state: AppState, config: &AppConfig) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(app(state, config))
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/health", get(public::health))
        .route("/healthz", get(public::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/token/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(skill_routes())
        .merge(project_routes())
        .merge(notification_routes())
        .merge(dashboard_routes())
        // Layers run outermost-last: the token is checked before the user is loaded
        .route_layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    let me = get(users::me_get)
        .put(users::me_update)
        .patch(users::me_update)
        .delete(users::me_delete);

    Router::new()
        .route("/api/users/me", me.clone())
        .route("/api/auth/me", me)
        .route("/api/users/change-password", post(users::change_password))
        .route("/api/users/stats", get(users::stats))
}

fn skill_routes() -> Router<AppState> {
    use protected::skills;

    Router::new()
        .route("/api/skills", get(skills::list).post(skills::create))
        .route(
            "/api/skills/:id",
            get(skills::show)
                .put(skills::update)
                .patch(skills::partial_update)
                .delete(skills::destroy),
        )
}

fn project_routes() -> Router<AppState> {
    use protected::projects;

    Router::new()
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/:id",
            get(projects::show)
                .put(projects::update)
                .patch(projects::partial_update)
                .delete(projects::destroy),
        )
        .route(
            "/api/projects/:project_id/milestones/:milestone_id",
            patch(projects::toggle_milestone),
        )
}

fn notification_routes() -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::list).delete(notifications::clear))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/mark-all-read", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", patch(notifications::mark_read))
        .route("/api/notifications/:id", axum::routing::delete(notifications::destroy))
}

fn dashboard_routes() -> Router<AppState> {
    use protected::dashboard;

    Router::new()
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/activity", get(dashboard::activity))
        .route("/api/dashboard/progress", get(dashboard::progress))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.security.cors_allow_all {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
