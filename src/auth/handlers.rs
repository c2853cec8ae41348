use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::dto::{CredentialsRequest, LoginResponse, MessageResponse},
    error::ApiError,
    state::AppState,
    users::repo::StoreError,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(payload) = payload?;
    let (email, password) = payload.into_parts()?;

    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::bad_request("Invalid email."));
    }

    // Ensure email is not taken
    match state.users.find_by_email(&email).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::conflict("User is already registered."));
        }
        Err(e) => return Err(ApiError::internal("find_by_email", e)),
    }

    let hash = state
        .hasher
        .hash(password)
        .await
        .map_err(|e| ApiError::internal("hash_password", e))?;

    let user = match state.users.insert(&email, &hash).await {
        Ok(u) => u,
        // lost a race with a concurrent registration
        Err(StoreError::DuplicateEmail) => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::conflict("User is already registered."));
        }
        Err(e) => return Err(ApiError::internal("create user", e)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully.")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let (email, password) = payload.into_parts()?;

    let user = match state.users.find_by_email(&email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %email, "login unknown email");
            return Err(ApiError::conflict("User is not registered."));
        }
        Err(e) => return Err(ApiError::internal("find_by_email", e)),
    };

    let ok = state
        .hasher
        .verify(password, user.password_hash.clone())
        .await
        .map_err(|e| ApiError::internal("verify_password", e))?;

    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized(
            "Invalid credentials. Please check your email and password.".into(),
        ));
    }

    let token = state
        .jwt
        .issue(user.id)
        .map_err(|e| ApiError::internal("jwt sign", e))?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(LoginResponse {
        message: "User logged in successfully.".into(),
        token,
    }))
}
