use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::error::ConfigError;
use crate::util::ReportingZone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Logfmt,
    Json,
}

/// Exporter settings. Every flag can also be set through its environment
/// variable; the command line wins when both are present.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sendgrid-stats-exporter",
    version,
    about = "Prometheus exporter for SendGrid email statistics"
)]
pub struct Config {
    /// Address to listen on for web interface and telemetry.
    #[arg(long = "web.listen-address", env = "LISTEN_ADDRESS", default_value = ":9154")]
    pub listen_address: String,

    /// Exclude metrics about the exporter process itself.
    #[arg(long = "web.disable-exporter-metrics", env = "DISABLE_EXPORTER_METRICS")]
    pub disable_exporter_metrics: bool,

    /// SendGrid API key.
    #[arg(long = "sendgrid.api-key", env = "SENDGRID_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Value of the `user_name` label, for telling several SendGrid users apart.
    #[arg(long = "sendgrid.username", env = "SENDGRID_USER_NAME", default_value = "")]
    pub user_name: String,

    /// Zone name (e.g. 'Asia/Tokyo'). Only applied together with a non-zero time offset.
    #[arg(long = "sendgrid.location", env = "SENDGRID_LOCATION", default_value = "")]
    pub location: String,

    /// Offset from UTC in seconds (e.g. '32400'). Needs a location.
    #[arg(
        long = "sendgrid.time-offset",
        env = "SENDGRID_TIME_OFFSET",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub time_offset: i32,

    /// Comma-separated SendGrid categories to collect per-category stats for.
    #[arg(long = "sendgrid.categories", env = "SENDGRID_CATEGORIES", default_value = "")]
    pub categories: String,

    /// Timeout for each SendGrid API call, in seconds.
    #[arg(
        long = "sendgrid.api-timeout",
        env = "SENDGRID_API_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub api_timeout_secs: u64,

    /// Default log filter when RUST_LOG is not set.
    #[arg(long = "log.level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long = "log.format", env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Logfmt)]
    pub log_format: LogFormat,
}

impl Config {
    /// Non-empty entries of the comma-separated category list, in order.
    pub fn categories(&self) -> Vec<String> {
        self.categories
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn reporting_zone(&self) -> Result<Option<ReportingZone>, ConfigError> {
        if self.location.is_empty() || self.time_offset == 0 {
            return Ok(None);
        }
        ReportingZone::new(self.location.clone(), self.time_offset)
            .map(Some)
            .ok_or(ConfigError::InvalidTimeOffset(self.time_offset))
    }

    /// Socket address to bind; a bare `:port` listens on all interfaces.
    pub fn listen_addr(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
