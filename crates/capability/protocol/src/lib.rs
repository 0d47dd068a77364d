//! # 协议通信能力模块
//!
//! 从 Modbus 从站读取寄存器并解码为信号：
//! - **codec**：U16 字到 S16 / U16 / F32 的纯函数转换
//! - **link**：`DeviceLink`，单个 TCP / RTU 会话上的读写原语
//! - **acquirer**：`SignalAcquirer`，换算物理读取数量、解码并生成 `Signal`
//!
//! ## 数据流
//!
//! ```text
//! PollSettings (start_address, count, register_type, data_format)
//!       │
//!       ▼
//! SignalAcquirer ── physical_count ──► RegisterLink::read_block
//!       │                                   │
//!       │◄──────────── RawWords ────────────┘
//!       ▼
//! codec (s16 / u16 / f32)
//!       │
//!       ▼
//! SignalBatch → PollLoop
//! ```
//!
//! ## 字序
//!
//! F32 占两个连续寄存器，第一个寄存器为 IEEE-754 位模式的高 16 位。

mod acquirer;
pub mod codec;
mod error;
mod link;
mod types;

pub use acquirer::SignalAcquirer;
pub use codec::{f32_to_u16_pair, round_to, u16_pair_to_f32, u16_to_s16};
pub use error::ProtocolError;
pub use link::{DeviceLink, RegisterLink};
pub use types::*;
