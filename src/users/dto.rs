use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    #[serde(default)]
    pub location: Option<String>,
}

impl LocationRequest {
    pub fn into_location(self) -> Result<String, ApiError> {
        self.location
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| ApiError::bad_request("Please provide a location."))
    }
}
