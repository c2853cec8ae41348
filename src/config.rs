use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.weatherbit.io/v2.0";

/// Upper bound for `JWT_TTL_MINUTES` (ten years).
pub const MAX_TTL_MINUTES: i64 = 10 * 366 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime. `None` issues tokens without `exp`.
    pub ttl_minutes: Option<i64>,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashConfig {
    pub work_factor: u32, // t-cost (iterations)
    pub memory_kib: u32,  // m-cost
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            work_factor: 2,
            memory_kib: 19 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub hash: HashConfig,
    pub weather: WeatherConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };

        let defaults = HashConfig::default();
        let hash = HashConfig {
            work_factor: parse_or("HASH_WORK_FACTOR", defaults.work_factor),
            memory_kib: parse_or("HASH_MEMORY_KIB", defaults.memory_kib),
        };

        let weather = WeatherConfig {
            api_key: std::env::var("WEATHER_API_KEY").context("WEATHER_API_KEY must be set")?,
            base_url: std::env::var("WEATHER_API_URL")
                .unwrap_or_else(|_| DEFAULT_WEATHER_API_URL.into()),
        };

        Ok(Self {
            database_url,
            jwt,
            hash,
            weather,
        })
    }
}

/// Unset or non-positive means no expiry; anything above [`MAX_TTL_MINUTES`]
/// or unparsable is a startup error.
fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let minutes = raw
        .parse::<i64>()
        .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw}"))?;
    if minutes > MAX_TTL_MINUTES {
        anyhow::bail!("JWT_TTL_MINUTES must be at most {MAX_TTL_MINUTES}, got {minutes}");
    }
    Ok((minutes > 0).then_some(minutes))
}

fn parse_or(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}
