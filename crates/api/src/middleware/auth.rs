//! Authentication middleware.
//!
//! Admin endpoints accept a bearer session token. The survey trigger
//! endpoints additionally accept an API key for machine callers.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use domain::models::Role;
use serde_json::json;

use crate::app::AppState;
use crate::extractors::api_key::ApiKeyAuth;
use crate::extractors::session::SessionUser;

/// Middleware that requires a valid session token.
///
/// The authenticated user is stored in request extensions for downstream
/// handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match session_from_request(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

/// Middleware for admin-only routes: a valid session with the ADMIN role.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match session_from_request(&state, &req) {
        Ok(user) => {
            if user.role != Role::Admin {
                return forbidden_response("Admin access required");
            }
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

/// Middleware that accepts either a session token or an `X-API-Key` header.
///
/// Used by the survey trigger endpoints, which are called both from the
/// admin UI and from external systems.
pub async fn require_session_or_api_key(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if req.headers().contains_key("X-API-Key") {
        let api_key = req
            .headers()
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        return match ApiKeyAuth::validate(&state.pool, &api_key).await {
            Ok(auth) => {
                req.extensions_mut().insert(auth);
                next.run(req).await
            }
            Err(err) => err.into_response(),
        };
    }

    match session_from_request(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

fn session_from_request(state: &AppState, req: &Request<Body>) -> Result<SessionUser, Response> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized_response("Missing session token"))?;

    SessionUser::from_token(&state.jwt, token)
        .map_err(|_| unauthorized_response("Invalid or expired session token"))
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}

fn forbidden_response(message: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "error": "forbidden",
            "message": message
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_response() {
        let response = unauthorized_response("Missing session token");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_response() {
        let response = forbidden_response("Admin access required");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
