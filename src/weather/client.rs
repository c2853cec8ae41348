use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::WeatherConfig;

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Query accepted by `/weather`; every field is forwarded only when present.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub city: Option<String>,
    pub units: Option<String>,
    pub lang: Option<String>,
}

/// Thin client for the upstream daily-forecast API.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(cfg: &WeatherConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("weatherdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
        })
    }

    /// Single attempt, no retry. The upstream body is returned as-is.
    pub async fn daily_forecast(&self, q: &ForecastQuery) -> Result<Value, WeatherError> {
        let url = format!("{}/forecast/daily", self.base_url);
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(4);
        for (name, value) in [("city", &q.city), ("units", &q.units), ("lang", &q.lang)] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                params.push((name, v));
            }
        }
        debug!(?params, "fetching forecast");
        params.push(("key", self.api_key.as_str()));

        // reqwest errors carry the request URL, which includes the key
        let body = self
            .http
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?
            .json::<Value>()
            .await
            .map_err(reqwest::Error::without_url)?;
        Ok(body)
    }
}
