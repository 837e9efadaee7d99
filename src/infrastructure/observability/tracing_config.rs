/// Configuration for tracing initialization, supplied by the config
/// layer.
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
}
