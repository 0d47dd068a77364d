use serde::{Deserialize, Serialize};
use std::fmt;

/// 告警类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    ThresholdHigh,
    ThresholdLow,
    ConnectionLost,
    /// 保留类型，规则引擎不提供判定逻辑
    Anomaly,
}

impl AlertType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThresholdHigh => "threshold_high",
            Self::ThresholdLow => "threshold_low",
            Self::ConnectionLost => "connection_lost",
            Self::Anomaly => "anomaly",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "threshold_high" => Ok(Self::ThresholdHigh),
            "threshold_low" => Ok(Self::ThresholdLow),
            "connection_lost" => Ok(Self::ConnectionLost),
            "anomaly" => Ok(Self::Anomaly),
            other => Err(format!("unknown alert type: {}", other)),
        }
    }
}

/// 告警级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[default]
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// 告警规则（构造后不可变，编辑 = 删除后重新添加）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub signal_name: String,
    pub alert_type: AlertType,
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub severity: Severity,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    pub fn new(
        signal_name: impl Into<String>,
        alert_type: AlertType,
        threshold: Option<f64>,
        severity: Severity,
    ) -> Self {
        Self {
            signal_name: signal_name.into(),
            alert_type,
            threshold,
            enabled: true,
            severity,
        }
    }

    /// 返回禁用状态的副本。
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// 规则命中后生成的告警记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub signal_name: String,
    pub alert_type: AlertType,
    pub message: String,
    pub severity: Severity,
    pub value: Option<f64>,
    pub timestamp_ms: i64,
}
