use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;

/// Knobs of the check-in pipeline.
#[derive(Debug, Clone)]
pub struct RegulationSettings {
    /// Max euclidean distance for a descriptor match
    pub face_tolerance: f64,
    pub checkin_match_threshold: f64,
    pub reidentify_threshold: f64,
    pub descriptor_cache_ttl: Duration,
    /// `None` disables proof archiving
    pub proof_dir: Option<PathBuf>,
}

impl Default for RegulationSettings {
    fn default() -> Self {
        Self {
            face_tolerance: 0.5,
            checkin_match_threshold: 0.2,
            reidentify_threshold: 0.8,
            descriptor_cache_ttl: Duration::from_secs(3600),
            proof_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: String,

    // Rate limiting
    pub rate_checkin_per_min: u32,
    pub rate_protected_per_min: u32,

    // Face encoder subprocess
    pub face_encoder_cmd: String,
    pub face_encoder_timeout: Duration,

    /// Local hour of the daily summary run
    pub report_hour: u32,

    pub regulation: RegulationSettings,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

/// Parses `raw` when present, otherwise returns `default`.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={value:?} is invalid: {e}")),
        None => Ok(default),
    }
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_or(key, env::var(key).ok(), default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let proof_dir = env::var("PROOF_DIR").unwrap_or_else(|_| "media/proofs".to_string());
        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),

            rate_checkin_per_min: var_or("RATE_CHECKIN_PER_MIN", 30)?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            face_encoder_cmd: env::var("FACE_ENCODER_CMD")
                .unwrap_or_else(|_| "face-encoder".to_string()),
            face_encoder_timeout: Duration::from_secs(var_or("FACE_ENCODER_TIMEOUT_SECS", 20)?),

            report_hour: var_or("REPORT_HOUR", 2)?,

            regulation: RegulationSettings {
                face_tolerance: var_or("FACE_TOLERANCE", 0.5)?,
                checkin_match_threshold: var_or("CHECKIN_MATCH_THRESHOLD", 0.2)?,
                reidentify_threshold: var_or("REIDENTIFY_THRESHOLD", 0.8)?,
                descriptor_cache_ttl: Duration::from_secs(var_or(
                    "DESCRIPTOR_CACHE_TTL_SECS",
                    3600,
                )?),
                proof_dir: (!proof_dir.trim().is_empty()).then(|| PathBuf::from(proof_dir)),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("CHECKIN_MATCH_THRESHOLD", self.regulation.checkin_match_threshold),
            ("REIDENTIFY_THRESHOLD", self.regulation.reidentify_threshold),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                bail!("{key} must be within [0, 1], got {value}");
            }
        }
        if self.regulation.face_tolerance <= 0.0 {
            bail!("FACE_TOLERANCE must be positive");
        }
        if self.report_hour > 23 {
            bail!("REPORT_HOUR must be within 0..=23, got {}", self.report_hour);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/test".into(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            rate_checkin_per_min: 30,
            rate_protected_per_min: 1000,
            face_encoder_cmd: "face-encoder".into(),
            face_encoder_timeout: Duration::from_secs(20),
            report_hour: 2,
            regulation: RegulationSettings::default(),
        }
    }
}
