mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AudioSettings, ConfigError, DatabaseSettings, DequeueSettings, LoggingSettings,
    LyricsSettings, PricingSettings, ServerSettings, Settings,
};
