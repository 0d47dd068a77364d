use crate::data::{DataFormat, RegisterKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 轮询间隔下限（毫秒）。
pub const MIN_INTERVAL_MS: u64 = 100;
/// 单次读取寄存器数量上限（Modbus 0x03/0x04）。
pub const MAX_REGISTERS_PER_READ: u16 = 125;
/// 单次读取位数量上限（Modbus 0x01/0x02）。
pub const MAX_BITS_PER_READ: u16 = 2000;

/// 设置校验错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("interval_ms must be >= 100, got {0}")]
    IntervalTooShort(u64),
    #[error("count must be >= 1")]
    EmptyCount,
    #[error("read of {physical} {kind} exceeds limit {limit}")]
    ReadTooLarge {
        kind: RegisterKind,
        physical: u32,
        limit: u16,
    },
    #[error("unit_id must be within 1..=247, got {0}")]
    UnitIdOutOfRange(u8),
    #[error("timeout must be >= 1 second")]
    ZeroTimeout,
}

/// 传输类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    #[default]
    Tcp,
    Serial,
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "serial" | "rtu" => Ok(Self::Serial),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// 设备连接参数（串口固定 8-N-1）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 连接与读写超时（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_unit_id")]
    pub unit_id: u8,
    #[serde(default = "default_serial_port")]
    pub serial_port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    502
}

fn default_timeout() -> u64 {
    5
}

fn default_unit_id() -> u8 {
    1
}

fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            transport: TransportKind::Tcp,
            host: default_host(),
            port: default_port(),
            timeout_secs: default_timeout(),
            unit_id: default_unit_id(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl ConnectionParams {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn serial(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            transport: TransportKind::Serial,
            serial_port: path.into(),
            baud_rate,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 日志中展示的端点描述。
    pub fn endpoint(&self) -> String {
        match self.transport {
            TransportKind::Tcp => format!("{}:{}", self.host, self.port),
            TransportKind::Serial => format!("{}@{}", self.serial_port, self.baud_rate),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=247).contains(&self.unit_id) {
            return Err(SettingsError::UnitIdOutOfRange(self.unit_id));
        }
        if self.timeout_secs == 0 {
            return Err(SettingsError::ZeroTimeout);
        }
        Ok(())
    }
}

/// 轮询参数。`count` 为值的个数，而非寄存器个数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSettings {
    #[serde(default)]
    pub start_address: u16,
    #[serde(default = "default_count")]
    pub count: u16,
    #[serde(default = "default_register_type")]
    pub register_type: RegisterKind,
    #[serde(default)]
    pub data_format: DataFormat,
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
}

fn default_count() -> u16 {
    5
}

fn default_register_type() -> RegisterKind {
    RegisterKind::Holding
}

fn default_interval() -> u64 {
    1000
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            start_address: 0,
            count: default_count(),
            register_type: default_register_type(),
            data_format: DataFormat::default(),
            interval_ms: default_interval(),
        }
    }
}

impl PollSettings {
    /// 线上实际读取的寄存器/位数量（F32 翻倍，位空间不翻倍）。
    pub fn physical_count(&self) -> u32 {
        physical_count(self.count, self.register_type, self.data_format)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(SettingsError::IntervalTooShort(self.interval_ms));
        }
        if self.count == 0 {
            return Err(SettingsError::EmptyCount);
        }
        let limit = if self.register_type.is_bit() {
            MAX_BITS_PER_READ
        } else {
            MAX_REGISTERS_PER_READ
        };
        let physical = self.physical_count();
        if physical > u32::from(limit) {
            return Err(SettingsError::ReadTooLarge {
                kind: self.register_type,
                physical,
                limit,
            });
        }
        Ok(())
    }
}

/// 计算物理读取数量：寄存器空间按格式放大，位空间保持原值。
pub fn physical_count(count: u16, kind: RegisterKind, format: DataFormat) -> u32 {
    if kind.is_bit() {
        u32::from(count)
    } else {
        u32::from(count) * u32::from(format.registers_per_value())
    }
}
