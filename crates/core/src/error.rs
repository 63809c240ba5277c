#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("update rate must be at least 1 Hz")]
    ZeroUpdateRate,
    #[error("{name} must not be negative (got {value}µs)")]
    NegativeDuration { name: &'static str, value: i64 },
}
