//! 信号采集
//!
//! 把逻辑读取请求（起始地址、值个数、寄存器类型、数据格式）换算成
//! 物理读取，并把原始字解码为带标识的 `Signal`。

use crate::codec::{decode_f32_words, round_to, u16_to_s16};
use crate::error::ProtocolError;
use crate::link::RegisterLink;
use crate::types::{RawWords, SignalLabels};
use domain::{
    now_epoch_ms, DataFormat, PollSettings, Signal, SignalBatch, SignalValue, StatusPolicy,
};
use tracing::{debug, warn, Span};

/// F32 保留的小数位数
const F32_DECIMALS: u32 = 4;

/// 信号采集器，独占一个寄存器链路。
pub struct SignalAcquirer<L> {
    link: L,
    policy: StatusPolicy,
    labels: SignalLabels,
    span: Span,
}

impl<L: RegisterLink> SignalAcquirer<L> {
    pub fn new(link: L, span: Span) -> Self {
        Self {
            link,
            policy: StatusPolicy::default(),
            labels: SignalLabels::default(),
            span,
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_labels(mut self, labels: SignalLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// 执行一次采集。
    ///
    /// 失败即本轮无数据，由调用方计入错误次数；链路已断开时先尝试重连一次。
    pub async fn acquire(&mut self, settings: &PollSettings) -> Result<SignalBatch, ProtocolError> {
        let physical = settings.physical_count();
        let physical = u16::try_from(physical).map_err(|_| {
            ProtocolError::DataParse(format!("physical read count {} out of range", physical))
        })?;

        if !self.link.is_connected() && !self.link.reconnect().await {
            return Err(ProtocolError::NotConnected);
        }

        let raw = match self
            .link
            .read_block(settings.register_type, settings.start_address, physical)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    parent: &self.span,
                    kind = %settings.register_type,
                    address = settings.start_address,
                    count = physical,
                    connected = self.link.is_connected(),
                    error = %e,
                    "signal read failed"
                );
                return Err(e);
            }
        };

        let values = self.decode(raw, settings.data_format);
        let read_at_ms = now_epoch_ms();
        let step = if settings.register_type.is_bit() {
            1
        } else {
            u32::from(settings.data_format.registers_per_value())
        };

        let signals: Vec<Signal> = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                // 地址超出 u16 时回绕，与设备侧的地址空间一致
                let offset = (i as u32).wrapping_mul(step);
                let address = (u32::from(settings.start_address).wrapping_add(offset)) as u16;
                Signal {
                    id: i,
                    address,
                    name: self.labels.name(i),
                    status: self.policy.classify(&value),
                    value,
                    unit: self.labels.unit(i),
                    last_update_ms: read_at_ms,
                }
            })
            .collect();

        debug!(
            parent: &self.span,
            kind = %settings.register_type,
            format = %settings.data_format,
            signals = signals.len(),
            "signals acquired"
        );

        Ok(SignalBatch {
            kind: settings.register_type,
            format: settings.data_format,
            signals,
            read_at_ms,
        })
    }

    fn decode(&self, raw: RawWords, format: DataFormat) -> Vec<SignalValue> {
        match raw {
            // 位空间不做数值格式转换
            RawWords::Bits(bits) => bits.into_iter().map(SignalValue::Bool).collect(),
            RawWords::Registers(words) => match format {
                DataFormat::S16 => words
                    .into_iter()
                    .map(|w| SignalValue::Int(i64::from(u16_to_s16(w))))
                    .collect(),
                DataFormat::U16 => words
                    .into_iter()
                    .map(|w| SignalValue::Int(i64::from(w)))
                    .collect(),
                DataFormat::F32 => {
                    let (floats, dropped) = decode_f32_words(&words);
                    if dropped > 0 {
                        warn!(
                            parent: &self.span,
                            received = words.len(),
                            "odd register count for f32, trailing word discarded"
                        );
                    }
                    floats
                        .into_iter()
                        .map(|f| SignalValue::Float(round_to(f64::from(f), F32_DECIMALS)))
                        .collect()
                }
            },
        }
    }
}
