use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;

/// Identity bound by [`require_auth`]. It lives in request extensions, which
/// clients cannot write, so handlers read it with `Extension<AuthUser>`.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingToken,
    #[error("Invalid token.")]
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": self.to_string() })),
        )
            .into_response()
    }
}

/// Gate for protected routes: reads the token from `Authorization`, verifies
/// it and binds the user id before the handler runs.
///
/// The token is sent raw; a leading `Bearer ` is tolerated.
pub async fn require_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = match req.headers().get(AUTHORIZATION).map(|v| v.to_str()) {
        None => None,
        Some(Ok(v)) => Some(v.trim()).filter(|v| !v.is_empty()),
        Some(Err(_)) => {
            warn!(reason = "invalid_token", kind = "non_ascii_header", uri = %req.uri(), "request rejected");
            return Err(AuthError::InvalidToken);
        }
    };
    let token = match token {
        Some(v) => v.strip_prefix("Bearer ").unwrap_or(v).to_owned(),
        None => {
            warn!(reason = "missing_token", uri = %req.uri(), "request rejected");
            return Err(AuthError::MissingToken);
        }
    };

    let user_id = keys.verify(&token).map_err(|e| {
        warn!(reason = "invalid_token", kind = %e, uri = %req.uri(), "request rejected");
        AuthError::InvalidToken
    })?;

    req.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(req).await)
}
