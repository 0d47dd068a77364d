use serde::{Deserialize, Serialize};
use std::fmt;

/// 寄存器地址空间（四类互不相交）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterKind {
    /// 保持寄存器（0x03 读 / 0x06 写）
    Holding,
    /// 输入寄存器（0x04）
    Input,
    /// 线圈（0x01 读 / 0x05 写）
    Coil,
    /// 离散输入（0x02）
    Discrete,
}

impl RegisterKind {
    /// 线圈与离散输入按位读取，不做数值格式转换。
    pub fn is_bit(self) -> bool {
        matches!(self, Self::Coil | Self::Discrete)
    }

    /// 仅保持寄存器与线圈可写。
    pub fn is_writable(self) -> bool {
        matches!(self, Self::Holding | Self::Coil)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Holding => "holding",
            Self::Input => "input",
            Self::Coil => "coil",
            Self::Discrete => "discrete",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RegisterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "holding" => Ok(Self::Holding),
            "input" => Ok(Self::Input),
            "coil" | "coils" => Ok(Self::Coil),
            "discrete" | "discrete_input" => Ok(Self::Discrete),
            other => Err(format!("unknown register type: {}", other)),
        }
    }
}

/// 寄存器数据格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    /// 16 位有符号整数（1 个寄存器）
    S16,
    /// 16 位无符号整数（1 个寄存器）
    #[default]
    U16,
    /// 32 位浮点数（2 个寄存器，高字在前）
    F32,
}

impl DataFormat {
    /// 每个值占用的寄存器数。
    pub fn registers_per_value(self) -> u16 {
        match self {
            Self::S16 | Self::U16 => 1,
            Self::F32 => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::S16 => "s16",
            Self::U16 => "u16",
            Self::F32 => "f32",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s16" | "int16" => Ok(Self::S16),
            "u16" | "uint16" => Ok(Self::U16),
            "f32" | "float32" => Ok(Self::F32),
            other => Err(format!("unknown data format: {}", other)),
        }
    }
}

/// 解码后的信号值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl SignalValue {
    /// 告警判断使用的数值视图（true = 1.0）。
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Bool(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Int(v) => *v as f64,
            Self::Float(v) => *v,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
        }
    }
}

/// 信号状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    #[default]
    Ok,
    Error,
}

impl SignalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 坏值判定策略。
///
/// 值等于哨兵值或绝对值超过上限时，信号状态记为 `error`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusPolicy {
    pub sentinel: f64,
    pub max_magnitude: f64,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self {
            sentinel: -9999.0,
            max_magnitude: 999_999.0,
        }
    }
}

impl StatusPolicy {
    pub fn classify(&self, value: &SignalValue) -> SignalStatus {
        let numeric = match value {
            SignalValue::Bool(_) => return SignalStatus::Ok,
            SignalValue::Int(v) => *v as f64,
            SignalValue::Float(v) => *v,
        };
        if !numeric.is_finite() || numeric == self.sentinel || numeric.abs() > self.max_magnitude
        {
            SignalStatus::Error
        } else {
            SignalStatus::Ok
        }
    }
}

/// 一次轮询产出的单个信号（创建后不再修改）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub id: usize,
    pub address: u16,
    pub name: String,
    pub value: SignalValue,
    pub unit: String,
    pub status: SignalStatus,
    pub last_update_ms: i64,
}

/// 一次成功轮询的完整批次。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalBatch {
    pub kind: RegisterKind,
    pub format: DataFormat,
    pub signals: Vec<Signal>,
    pub read_at_ms: i64,
}

impl SignalBatch {
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// 获取当前时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
