use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Body of `/register` and `/login`. Both fields are optional at the serde
/// level so a missing field is answered with our own 400.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Returns the normalized email and the password, or `BadRequest`.
    pub fn into_parts(self) -> Result<(String, String), ApiError> {
        let email = self
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty());
        let password = self.password.filter(|p| !p.is_empty());
        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ApiError::bad_request("Please provide all details.")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}
