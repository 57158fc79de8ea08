use std::env;
use std::str::FromStr;

use notewell_gaps::DetectionConfig;

/// Runtime configuration read from the Lambda environment.
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub bucket: String,
    pub detection: DetectionConfig,
}

impl LambdaConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to defaults; set but
    /// unparseable keys are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let defaults = DetectionConfig::default();

        let detection = DetectionConfig {
            review_threshold: parse_or(
                &lookup,
                "NOTEWELL_REVIEW_THRESHOLD",
                defaults.review_threshold,
            )?,
            critical_threshold: parse_or(
                &lookup,
                "NOTEWELL_CRITICAL_THRESHOLD",
                defaults.critical_threshold,
            )?,
            keyword_weight: parse_or(&lookup, "NOTEWELL_KEYWORD_WEIGHT", defaults.keyword_weight)?,
            required_weight: parse_or(
                &lookup,
                "NOTEWELL_REQUIRED_WEIGHT",
                defaults.required_weight,
            )?,
            default_min_length: parse_or(
                &lookup,
                "NOTEWELL_DEFAULT_MIN_LENGTH",
                defaults.default_min_length,
            )?,
        };
        detection
            .validate()
            .map_err(|e| eyre::eyre!("invalid detection settings: {e}"))?;

        Ok(Self {
            bucket: lookup("NOTEWELL_BUCKET").unwrap_or_else(|| "notewell".to_string()),
            detection,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("{key}={raw:?} is not valid: {e}")),
        None => Ok(default),
    }
}
