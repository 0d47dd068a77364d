//! 应用运行配置加载。

use domain::{
    AlertRule, ConnectionParams, DataFormat, PollSettings, RegisterKind, SettingsError,
    StatusPolicy, TransportKind,
};
use std::env;
use std::str::FromStr;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("failed to read rules file {0}: {1}")]
    RulesFile(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub connection: ConnectionParams,
    pub poll: PollSettings,
    pub signal_names: Vec<String>,
    pub signal_units: Vec<String>,
    pub status_policy: StatusPolicy,
    pub alert_history: usize,
    pub alert_rules: Vec<AlertRule>,
    pub retention_days: u32,
    /// 内存中保留的信号记录上限
    pub history_capacity: usize,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置；空字符串视为未设置。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let http_addr = get("MBMON_HTTP_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string());

        let defaults = ConnectionParams::default();
        let connection = ConnectionParams {
            transport: read_or(&get, "MBMON_TRANSPORT", TransportKind::Tcp)?,
            host: get("MBMON_HOST").unwrap_or(defaults.host),
            port: read_or(&get, "MBMON_PORT", defaults.port)?,
            timeout_secs: read_or(&get, "MBMON_TIMEOUT_SECONDS", defaults.timeout_secs)?,
            unit_id: read_or(&get, "MBMON_UNIT_ID", defaults.unit_id)?,
            serial_port: get("MBMON_SERIAL_PORT").unwrap_or(defaults.serial_port),
            baud_rate: read_or(&get, "MBMON_BAUD_RATE", defaults.baud_rate)?,
        };
        connection.validate().map_err(|e| {
            let key = match e {
                SettingsError::ZeroTimeout => "MBMON_TIMEOUT_SECONDS",
                _ => "MBMON_UNIT_ID",
            };
            ConfigError::Invalid(key.to_string(), e.to_string())
        })?;

        let poll = PollSettings {
            start_address: read_or(&get, "MBMON_START_ADDRESS", 0)?,
            count: read_or(&get, "MBMON_COUNT", 5)?,
            register_type: read_or(&get, "MBMON_REGISTER_TYPE", RegisterKind::Holding)?,
            data_format: read_or(&get, "MBMON_DATA_FORMAT", DataFormat::U16)?,
            interval_ms: read_or(&get, "MBMON_INTERVAL_MS", 1000)?,
        };
        poll.validate()
            .map_err(|e| ConfigError::Invalid("poll settings".to_string(), e.to_string()))?;

        let policy_defaults = StatusPolicy::default();
        let status_policy = StatusPolicy {
            sentinel: read_or(&get, "MBMON_BAD_VALUE_SENTINEL", policy_defaults.sentinel)?,
            max_magnitude: read_or(
                &get,
                "MBMON_BAD_VALUE_MAGNITUDE",
                policy_defaults.max_magnitude,
            )?,
        };

        let alert_rules = match get("MBMON_ALERT_RULES_FILE") {
            Some(path) => load_rules_file(&path)?,
            None => Vec::new(),
        };

        Ok(Self {
            http_addr,
            connection,
            poll,
            signal_names: read_list(get("MBMON_SIGNAL_NAMES")),
            signal_units: read_list(get("MBMON_SIGNAL_UNITS")),
            status_policy,
            alert_history: read_positive(&get, "MBMON_ALERT_HISTORY", 1000)?,
            alert_rules,
            retention_days: read_or(&get, "MBMON_RETENTION_DAYS", 30)?,
            history_capacity: read_positive(&get, "MBMON_HISTORY_CAPACITY", 100_000)?,
        })
    }
}

/// 读取告警规则文件（JSON 数组）。
pub fn load_rules_file(path: &str) -> Result<Vec<AlertRule>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::RulesFile(path.to_string(), e.to_string()))?;
    parse_rules(&content).map_err(|e| ConfigError::RulesFile(path.to_string(), e))
}

/// 解析告警规则 JSON。
pub fn parse_rules(content: &str) -> Result<Vec<AlertRule>, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

fn read_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid(key.to_string(), value)),
        None => Ok(default),
    }
}

fn read_positive<G>(get: &G, key: &str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match read_or(get, key, default)? {
        0 => Err(ConfigError::Invalid(key.to_string(), "0".to_string())),
        value => Ok(value),
    }
}

/// 逗号分隔列表；保留空位，"a,,c" 的第二项为空。
fn read_list(value: Option<String>) -> Vec<String> {
    match value {
        Some(value) => value.split(',').map(|item| item.trim().to_string()).collect(),
        None => Vec::new(),
    }
}
