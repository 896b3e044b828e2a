use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;

pub const DEFAULT_TICKERS: &[&str] = &[
    "RELIANCE.NS", "TCS.NS", "INFY.NS", "HDFCBANK.NS", "ICICIBANK.NS", "SBIN.NS",
    "BHARTIARTL.NS", "HINDUNILVR.NS", "ITC.NS", "LT.NS",
];

const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

// Window lengths and thresholds used by the analytics
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub streak_min_days: usize, // streak length that triggers a result
    pub chart_window: usize,    // trailing bars shipped for the sparkline
    pub momentum_period: usize, // trading days, 5 = one week
    pub top_n: usize,
    pub sma_period: usize,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            streak_min_days: 3,
            chart_window: 7,
            momentum_period: 5,
            top_n: 3,
            sma_period: 20,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> anyhow::Result<()> {
        let fields = [
            ("streak_min_days", self.streak_min_days),
            ("chart_window", self.chart_window),
            ("momentum_period", self.momentum_period),
            ("top_n", self.top_n),
            ("sma_period", self.sma_period),
        ];
        for (name, value) in fields {
            if value == 0 {
                bail!("analysis.{} must be greater than 0", name);
            }
        }
        Ok(())
    }
}

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub tickers: Option<Vec<String>>,
    pub yahoo_base_url: Option<String>,
    pub history_range: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub rate_limit_per_minute: Option<u32>,
    pub replenish_interval_secs: Option<u64>,
    pub burst_size: Option<u32>,
    pub analysis: Option<AnalysisParams>,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub tickers: Vec<String>,
    pub yahoo_base_url: String,
    pub history_range: String,
    pub request_timeout: Duration,
    pub rate_limit_per_minute: u32,
    pub replenish_interval_secs: u64,
    pub burst_size: u32,
    pub analysis: AnalysisParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_yaml_config(ConfigYaml::default())
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        let config = match env::var("CONFIG_FILE") {
            Ok(config_file) => Self::from_yaml(&config_file)?,
            Err(_) => Self::from_env(),
        };
        config.analysis.validate()?;
        if config.tickers.is_empty() {
            bail!("ticker list must not be empty");
        }
        Ok(config)
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        Ok(Self::from_yaml_config(yaml_config))
    }

    fn from_yaml_config(yaml: ConfigYaml) -> Self {
        Self {
            node_name: yaml.node_name.unwrap_or_else(|| "trend-scanner".to_string()),
            environment: yaml.environment.unwrap_or_else(|| "development".to_string()),
            port: yaml.port.unwrap_or(5000),
            tickers: yaml
                .tickers
                .unwrap_or_else(|| DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect()),
            yahoo_base_url: yaml
                .yahoo_base_url
                .unwrap_or_else(|| DEFAULT_YAHOO_BASE_URL.to_string()),
            history_range: yaml.history_range.unwrap_or_else(|| "1mo".to_string()),
            request_timeout: Duration::from_secs(yaml.request_timeout_secs.unwrap_or(30)),
            rate_limit_per_minute: yaml.rate_limit_per_minute.unwrap_or(60),
            replenish_interval_secs: yaml.replenish_interval_secs.unwrap_or(2),
            burst_size: yaml.burst_size.unwrap_or(5),
            analysis: yaml.analysis.unwrap_or_default(),
        }
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present

        let tickers = env::var("TICKERS").ok().map(|s| parse_ticker_list(&s));

        let yaml = ConfigYaml {
            node_name: env::var("NODE_NAME").ok(),
            environment: env::var("ENVIRONMENT").ok(),
            port: parse_env("PORT"),
            tickers,
            yahoo_base_url: env::var("YAHOO_BASE_URL").ok(),
            history_range: env::var("HISTORY_RANGE").ok(),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT"),
            rate_limit_per_minute: parse_env("RATE_LIMIT_PER_MINUTE"),
            replenish_interval_secs: parse_env("REPLENISH_INTERVAL_SECS"),
            burst_size: parse_env("BURST_SIZE"),
            analysis: None,
        };

        Self::from_yaml_config(yaml)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

pub fn parse_ticker_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
