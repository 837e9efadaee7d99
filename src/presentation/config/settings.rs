use serde::Deserialize;

use super::Environment;

#[derive(Debug, thiserror::Error)]
#[error("configuration: {0}")]
pub struct ConfigError(String);

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub environment: Environment,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub lyrics: LyricsSettings,
    pub audio: AudioSettings,
    pub pricing: PricingSettings,
    pub dequeue: DequeueSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Public base URL of this deployment; embedded in callback
    /// addresses handed to the audio service.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricingSettings {
    /// Fixed price of one song in credits; charged once, at the
    /// audio-stage claim.
    pub song_credits: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// JSON log output; on by default in prod, overridable with
    /// LOG_FORMAT.
    pub json_format: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DequeueSettings {
    /// Period of the built-in dequeue tickers. External triggers may
    /// additionally hit the /internal/dequeue endpoints; overlap is
    /// safe.
    pub interval_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match std::env::var("APP_ENV") {
            Ok(raw) => Environment::try_from(raw).map_err(ConfigError)?,
            Err(_) => Environment::Local,
        };

        Ok(Self {
            environment,
            logging: LoggingSettings {
                json_format: match std::env::var("LOG_FORMAT") {
                    Ok(v) => v.to_lowercase() == "json",
                    Err(_) => environment == Environment::Prod,
                },
            },
            server: ServerSettings {
                host: env_or("SERVER_HOST", "0.0.0.0"),
                port: parsed_env("SERVER_PORT", 3000)?,
                public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000"),
            },
            database: DatabaseSettings {
                url: required_env("DATABASE_URL")?,
                max_connections: parsed_env("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            lyrics: LyricsSettings {
                base_url: env_or("LYRICS_API_BASE_URL", "https://api.openai.com"),
                api_key: required_env("LYRICS_API_KEY")?,
                model: env_or("LYRICS_MODEL", "gpt-4o-mini"),
                timeout_secs: parsed_env("LYRICS_TIMEOUT_SECS", 60)?,
            },
            audio: AudioSettings {
                base_url: required_env("AUDIO_API_BASE_URL")?,
                api_key: required_env("AUDIO_API_KEY")?,
                timeout_secs: parsed_env("AUDIO_TIMEOUT_SECS", 30)?,
            },
            pricing: PricingSettings {
                song_credits: parsed_env("SONG_PRICE_CREDITS", 1)?,
            },
            dequeue: DequeueSettings {
                interval_secs: parsed_env("DEQUEUE_INTERVAL_SECS", 10)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError(format!("{} must be set", key)))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
