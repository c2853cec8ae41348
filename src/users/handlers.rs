use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{patch, post},
    Extension, Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::LocationRequest,
    repo_types::{Preferences, User, UNIT_SYSTEMS},
};
use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{require_auth, AuthUser},
    },
    error::ApiError,
    state::AppState,
};

/// Every route here sits behind the auth gate.
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/userdetails", post(user_details))
        .route("/addPreference", post(add_preference))
        .route("/addLocation", post(add_location))
        .route("/removeLocation", patch(remove_location))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    match state.users.find_by_id(user_id).await {
        Ok(Some(u)) => Ok(u),
        Ok(None) => {
            warn!(%user_id, "user not found");
            Err(ApiError::not_found("User not found."))
        }
        Err(e) => Err(ApiError::internal("find_by_id", e)),
    }
}

#[instrument(skip(state))]
pub async fn user_details(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<User>, ApiError> {
    load_user(&state, user_id).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn add_preference(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<Preferences>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(prefs) = payload?;
    if !UNIT_SYSTEMS.contains(&prefs.unit_preference.as_str()) {
        return Err(ApiError::bad_request("Invalid unit preference."));
    }
    if prefs.language_preference.trim().is_empty() {
        return Err(ApiError::bad_request("Invalid language preference."));
    }

    load_user(&state, user_id).await?;
    let updated = state
        .users
        .set_preferences(user_id, &prefs)
        .await
        .map_err(|e| ApiError::internal("set_preferences", e))?;
    if !updated {
        return Err(ApiError::not_found("User not found."));
    }

    info!(%user_id, unit = %prefs.unit_preference, lang = %prefs.language_preference, "preferences updated");
    Ok(Json(MessageResponse::new("User Preference Updated.")))
}

#[instrument(skip(state, payload))]
pub async fn add_location(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    let location = payload.into_location()?;

    let user = load_user(&state, user_id).await?;
    if user.saved_locations.contains(&location) {
        return Err(ApiError::conflict("Location already in savedLocations."));
    }

    let added = state
        .users
        .add_location(user_id, &location)
        .await
        .map_err(|e| ApiError::internal("add_location", e))?;
    // a concurrent request may have added it in between
    if !added {
        return Err(ApiError::conflict("Location already in savedLocations."));
    }

    info!(%user_id, %location, "location added");
    Ok(Json(MessageResponse::new(
        "User location added to savedLocations.",
    )))
}

#[instrument(skip(state, payload))]
pub async fn remove_location(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    payload: Result<Json<LocationRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;
    let location = payload.into_location()?;

    let user = load_user(&state, user_id).await?;
    if !user.saved_locations.contains(&location) {
        return Err(ApiError::not_found("Location not found."));
    }

    let removed = state
        .users
        .remove_location(user_id, &location)
        .await
        .map_err(|e| ApiError::internal("remove_location", e))?;
    if !removed {
        return Err(ApiError::not_found("Location not found."));
    }

    info!(%user_id, %location, "location removed");
    Ok(Json(MessageResponse::new("Location removed successfully.")))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE},
            Method, Request, StatusCode,
        },
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    struct Harness {
        state: AppState,
        user_id: Uuid,
        token: String,
    }

    async fn harness() -> Harness {
        let state = AppState::fake();
        let user = state.users.insert("a@x.com", "hash").await.unwrap();
        let token = state.jwt.issue(user.id).unwrap();
        Harness {
            state,
            user_id: user.id,
            token,
        }
    }

    impl Harness {
        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let app = user_routes(self.state.clone()).with_state(self.state.clone());
            let mut req = Request::builder()
                .method(method)
                .uri(uri)
                .header(AUTHORIZATION, &self.token);
            let body = match body {
                Some(b) => {
                    req = req.header(CONTENT_TYPE, "application/json");
                    Body::from(b.to_string())
                }
                None => Body::empty(),
            };
            let res = app.oneshot(req.body(body).unwrap()).await.unwrap();
            let status = res.status();
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
        }

        async fn locations(&self) -> Vec<String> {
            self.state
                .users
                .find_by_id(self.user_id)
                .await
                .unwrap()
                .unwrap()
                .saved_locations
        }
    }

    #[tokio::test]
    async fn user_details_returns_own_record() {
        let h = harness().await;
        let (status, body) = h.send(Method::POST, "/userdetails", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["id"], h.user_id.to_string());
        assert!(body.get("passwordHash").is_none());
        assert_eq!(body["preferences"]["languagePreference"], "en");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let mut h = harness().await;
        h.token = h.state.jwt.issue(Uuid::new_v4()).unwrap();
        let (status, _) = h.send(Method::POST, "/userdetails", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn preferences_ignore_client_supplied_user_id() {
        let h = harness().await;
        let other = h.state.users.insert("b@x.com", "hash").await.unwrap();

        let body = json!({
            "unitPreference": "I",
            "languagePreference": "de",
            "userId": other.id,
        });
        let (status, res) = h.send(Method::POST, "/addPreference", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["message"], "User Preference Updated.");

        let me = h.state.users.find_by_id(h.user_id).await.unwrap().unwrap();
        assert_eq!(me.preferences.unit_preference, "I");
        assert_eq!(me.preferences.language_preference, "de");
        let them = h.state.users.find_by_id(other.id).await.unwrap().unwrap();
        assert_eq!(them.preferences, Preferences::default());
    }

    #[tokio::test]
    async fn preferences_reject_unknown_unit() {
        let h = harness().await;
        let (status, _) = h
            .send(
                Method::POST,
                "/addPreference",
                Some(json!({ "unitPreference": "kelvin" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_location_conflicts_and_leaves_set_unchanged() {
        let h = harness().await;
        let body = json!({ "location": "Lisbon" });
        let (status, _) = h.send(Method::POST, "/addLocation", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, res) = h.send(Method::POST, "/addLocation", Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(res["message"], "Location already in savedLocations.");
        assert_eq!(h.locations().await, vec!["Lisbon".to_string()]);
    }

    #[tokio::test]
    async fn removing_absent_location_is_not_found() {
        let h = harness().await;
        h.send(
            Method::POST,
            "/addLocation",
            Some(json!({ "location": "Lisbon" })),
        )
        .await;

        let (status, _) = h
            .send(
                Method::PATCH,
                "/removeLocation",
                Some(json!({ "location": "Porto" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(h.locations().await, vec!["Lisbon".to_string()]);
    }

    #[tokio::test]
    async fn add_then_remove_restores_set() {
        let h = harness().await;
        h.send(Method::POST, "/addLocation", Some(json!({ "location": "Oslo" })))
            .await;
        let before = h.locations().await;

        let (status, _) = h
            .send(Method::POST, "/addLocation", Some(json!({ "location": "Rome" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, res) = h
            .send(
                Method::PATCH,
                "/removeLocation",
                Some(json!({ "location": "Rome" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(res["message"], "Location removed successfully.");
        assert_eq!(h.locations().await, before);
    }

    #[tokio::test]
    async fn missing_location_is_bad_request() {
        let h = harness().await;
        let (status, _) = h.send(Method::POST, "/addLocation", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = h.send(Method::POST, "/addLocation", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn routes_require_token() {
        let h = harness().await;
        let app = user_routes(h.state.clone()).with_state(h.state.clone());
        let res = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/userdetails")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
