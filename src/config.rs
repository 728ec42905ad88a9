use crate::engine::WeeklySchedule;
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub draw_weekday: Weekday,
    pub draw_time: NaiveTime,
    pub draw_timezone: Tz,
    pub scheduler_retry: Duration,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let draw_weekday = env_map
            .get("DRAW_WEEKDAY")
            .map(|s| s.as_str())
            .unwrap_or("sat")
            .parse::<Weekday>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "DRAW_WEEKDAY".to_string(),
                    "must be a weekday such as sat or saturday".to_string(),
                )
            })?;

        let draw_time_str = env_map
            .get("DRAW_TIME")
            .map(|s| s.as_str())
            .unwrap_or("17:00");
        let draw_time = NaiveTime::parse_from_str(draw_time_str, "%H:%M").map_err(|_| {
            ConfigError::InvalidValue(
                "DRAW_TIME".to_string(),
                format!("must be HH:MM, got {}", draw_time_str),
            )
        })?;

        let tz_str = env_map
            .get("DRAW_TIMEZONE")
            .map(|s| s.as_str())
            .unwrap_or("Europe/Copenhagen");
        let draw_timezone = tz_str.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidValue(
                "DRAW_TIMEZONE".to_string(),
                format!("must be an IANA time zone, got {}", tz_str),
            )
        })?;

        let retry_secs = env_map
            .get("SCHEDULER_RETRY_SECS")
            .map(|s| s.as_str())
            .unwrap_or("300")
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SCHEDULER_RETRY_SECS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let currency = env_map
            .get("CURRENCY")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "DKK".to_string());

        Ok(Config {
            port,
            database_path,
            draw_weekday,
            draw_time,
            draw_timezone,
            scheduler_retry: Duration::from_secs(retry_secs),
            currency,
        })
    }

    pub fn schedule(&self) -> WeeklySchedule {
        WeeklySchedule::new(self.draw_weekday, self.draw_time, self.draw_timezone)
    }
}
