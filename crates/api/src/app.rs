use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, require_session,
    require_session_or_api_key, security_headers_middleware, trace_id,
};
use crate::routes::{api_keys, auth, health, logs, settings, surveys, templates, users};
use crate::services::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub email: EmailService,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);
    let jwt = Arc::new(JwtConfig::with_leeway(
        &config.auth.jwt_secret,
        config.auth.token_expiry_secs,
        config.auth.leeway_secs,
    ));

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        jwt,
        email: EmailService::new(pool),
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public routes: health, metrics, login, and the recipient-facing
    // survey endpoints (the survey UUID is the capability).
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/auth/login", post(auth::login))
        .route("/api/surveys/:id/public", get(surveys::get_public_survey))
        .route("/api/surveys/:id/submit", post(surveys::submit_survey));

    // Triggering accepts a session token or an API key, so external
    // systems can start surveys without an admin session.
    let trigger_routes = Router::new()
        .route("/api/surveys", post(surveys::trigger_survey))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session_or_api_key,
        ));

    // Session routes: any authenticated user
    let session_routes = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/surveys/:id/retrigger",
            post(surveys::retrigger_survey),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    // Management surface requires the ADMIN role
    let admin_routes = Router::new()
        .route("/api/surveys", get(surveys::list_surveys))
        .route("/api/surveys/stats", get(surveys::survey_stats))
        .route("/api/surveys/:id", delete(surveys::delete_survey))
        .route("/api/templates", get(templates::list_templates))
        .route("/api/templates", post(templates::create_template))
        .route("/api/templates/:id", get(templates::get_template))
        .route("/api/templates/:id", put(templates::update_template))
        .route("/api/templates/:id", delete(templates::delete_template))
        .route("/api/settings", get(settings::get_settings))
        .route("/api/settings", post(settings::update_settings))
        .route("/api/settings/test-email", post(settings::send_test_email))
        .route("/api/api-keys", get(api_keys::list_api_keys))
        .route("/api/api-keys", post(api_keys::create_api_key))
        .route("/api/api-keys/:id", delete(api_keys::delete_api_key))
        .route("/api/logs/email", get(logs::list_email_logs))
        .route("/api/logs/backend", get(logs::list_backend_logs))
        .route("/api/logs/backend", delete(logs::prune_backend_logs))
        .route("/api/users", get(users::list_users))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:id", delete(users::delete_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public_routes)
        .merge(trigger_routes)
        .merge(session_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
