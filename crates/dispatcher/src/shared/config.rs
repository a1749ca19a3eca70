use serde::Deserialize;
use url::Url;

use crate::domain::category::channel::ChannelConfig;
use crate::domain::category::filters::TaggedFilterNode;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub workflow: WorkflowConfig,
    pub notification: NotificationConfig,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Base path or absolute URL of the leave backend
    #[serde(default)]
    pub base: String,
    /// Origin used to qualify a relative base
    pub origin: String,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    #[serde(default = "default_max_per_day")]
    pub max_per_day: u32,
    #[serde(default = "default_weekend_days")]
    pub weekend_days: Vec<u8>,
    #[serde(default = "default_calendar_update_mode")]
    pub calendar_update_mode: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    pub default_channel_id: String,
    /// Static filter on the driver selector (former `data-category-filter`)
    #[serde(default)]
    pub driver_select_filter: String,
    /// Nodes tagged as category filters (former `[data-driver-category-filter]`)
    #[serde(default)]
    pub tagged_filters: Vec<TaggedFilterNode>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    pub admin_chat_id: String,
    #[serde(default)]
    pub dispatch_policy: DispatchPolicy,
    #[serde(default = "default_true")]
    pub attach_snapshot: bool,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

/// Что делать с оставшимися отправками после ошибки
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    #[default]
    AbortOnFailure,
    ContinueOnFailure,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_per_day() -> u32 {
    3
}

fn default_weekend_days() -> Vec<u8> {
    vec![6, 0]
}

fn default_calendar_update_mode() -> String {
    "after_approval".to_string()
}

fn default_timezone() -> String {
    crate::shared::dates::DEFAULT_TIMEZONE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_jpeg_quality() -> u8 {
    92
}

pub const DEFAULT_API_BASE: &str = "/atc/public";
pub const DEFAULT_CALENDAR_ID: &str =
    "a63b18e7b18d3291057cbcdb6c055d60f0d6d6fd399fac158b447dc88801f677@group.calendar.google.com";

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:3000"

[api]
base = "/atc/public"
origin = "http://127.0.0.1:8080"
timeout_secs = 30

[workflow]
max_per_day = 3
weekend_days = [6, 0]
calendar_update_mode = "after_approval"
timezone = "Asia/Kuala_Lumpur"
default_channel_id = "12WHEEL_TRAILER"

[notification]
admin_chat_id = "120363368545737149@g.us"
dispatch_policy = "abort_on_failure"
attach_snapshot = true
jpeg_quality = 92

[[channels]]
id = "LOWBED"
label = "LOWBED"
chat_id = "120363368545737149@g.us"
calendar_id = "a63b18e7b18d3291057cbcdb6c055d60f0d6d6fd399fac158b447dc88801f677@group.calendar.google.com"

[[channels]]
id = "12WHEEL_TRAILER"
label = "12WHEEL + TRAILER"
chat_id = "120363368545737149@g.us"
calendar_id = "a63b18e7b18d3291057cbcdb6c055d60f0d6d6fd399fac158b447dc88801f677@group.calendar.google.com"

[[channels]]
id = "KSK"
label = "KSK"
chat_id = "120363368545737149@g.us"
calendar_id = "a63b18e7b18d3291057cbcdb6c055d60f0d6d6fd399fac158b447dc88801f677@group.calendar.google.com"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    default_config()
}

pub fn default_config() -> anyhow::Result<Config> {
    Ok(toml::from_str(DEFAULT_CONFIG)?)
}

/// Нормализация базового URL API
///
/// Whitespace is removed, an empty value becomes `/atc/public`, trailing
/// slashes are stripped. Relative bases are qualified with `origin`.
pub fn normalize_api_base(raw: &str, origin: &str) -> anyhow::Result<Url> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let selected = if compact.is_empty() {
        DEFAULT_API_BASE.to_string()
    } else {
        compact
    };
    let trimmed = selected.trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();

    let absolute = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        let prefixed = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };
        format!("{}{}", origin.trim_end_matches('/'), prefixed)
    };

    Url::parse(&absolute).map_err(|e| anyhow::anyhow!("Invalid API base '{}': {}", absolute, e))
}
