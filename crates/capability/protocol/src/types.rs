//! 协议相关类型定义

/// 一次读取返回的原始数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawWords {
    /// 保持/输入寄存器字
    Registers(Vec<u16>),
    /// 线圈/离散输入位
    Bits(Vec<bool>),
}

impl RawWords {
    pub fn len(&self) -> usize {
        match self {
            Self::Registers(words) => words.len(),
            Self::Bits(bits) => bits.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 外部提供的信号名称与单位，按值序号对应。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalLabels {
    pub names: Vec<String>,
    pub units: Vec<String>,
}

impl SignalLabels {
    pub fn new(names: Vec<String>, units: Vec<String>) -> Self {
        Self { names, units }
    }

    /// 第 `index` 个值的名称，缺省为 "Signal {index+1}"。
    pub fn name(&self, index: usize) -> String {
        self.names
            .get(index)
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| format!("Signal {}", index + 1))
    }

    pub fn unit(&self, index: usize) -> String {
        self.units.get(index).cloned().unwrap_or_default()
    }
}
