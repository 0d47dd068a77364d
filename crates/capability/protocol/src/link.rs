//! Modbus 设备链路
//!
//! `DeviceLink` 持有到单个从站的一条传输会话（TCP 或 RTU 串口），
//! 只提供连接/断开/读/写原语，不做数据解码。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let mut link = DeviceLink::new(component_span("plc-1", "link"));
//! if link.connect(&ConnectionParams::tcp("192.168.1.100", 502)).await {
//!     let words = link.read_block(RegisterKind::Holding, 0, 10).await?;
//! }
//! ```

use crate::error::ProtocolError;
use crate::types::RawWords;
use async_trait::async_trait;
use domain::{ConnectionParams, RegisterKind, TransportKind};
use std::future::Future;
use std::time::Duration;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tokio_modbus::ExceptionCode;
use tokio_serial::{DataBits, Parity, SerialStream, StopBits};
use tracing::{debug, info, warn, Span};

/// 寄存器链路抽象：采集器通过它访问设备。
#[async_trait]
pub trait RegisterLink: Send {
    fn is_connected(&self) -> bool;

    /// 会话已断开时尝试用上次的参数重连，默认不支持。
    async fn reconnect(&mut self) -> bool {
        false
    }

    /// 一次线上读取 `count` 个连续寄存器/位。
    async fn read_block(
        &mut self,
        kind: RegisterKind,
        address: u16,
        count: u16,
    ) -> Result<RawWords, ProtocolError>;

    /// 写单个保持寄存器或线圈（线圈非零即合闸），失败返回 false。
    async fn write_block(&mut self, kind: RegisterKind, address: u16, value: u16) -> bool;
}

/// Modbus 设备会话
pub struct DeviceLink {
    ctx: Option<Context>,
    params: Option<ConnectionParams>,
    span: Span,
}

impl DeviceLink {
    pub fn new(span: Span) -> Self {
        Self {
            ctx: None,
            params: None,
            span,
        }
    }

    /// 最近一次连接使用的参数。
    pub fn params(&self) -> Option<&ConnectionParams> {
        self.params.as_ref()
    }

    /// 建立会话，失败只记录日志并返回 false。
    pub async fn connect(&mut self, params: &ConnectionParams) -> bool {
        match self.try_connect(params).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    parent: &self.span,
                    endpoint = %params.endpoint(),
                    unit_id = params.unit_id,
                    error = %e,
                    "modbus connect failed"
                );
                false
            }
        }
    }

    /// 建立会话并返回失败原因。已连接时先释放旧会话。
    pub async fn try_connect(&mut self, params: &ConnectionParams) -> Result<(), ProtocolError> {
        params.validate()?;
        self.disconnect().await;
        self.params = Some(params.clone());

        let slave = Slave(params.unit_id);
        let ctx = match params.transport {
            TransportKind::Tcp => {
                let addr = with_timeout(
                    params.timeout(),
                    "resolve",
                    tokio::net::lookup_host((params.host.as_str(), params.port)),
                )
                .await?
                .next()
                .ok_or_else(|| {
                    ProtocolError::Connection(format!("no address for {}", params.host))
                })?;
                with_timeout(params.timeout(), "connect", tcp::connect_slave(addr, slave))
                    .await
                    .map_err(connection_error)?
            }
            TransportKind::Serial => {
                // 串口固定 8-N-1
                let builder = tokio_serial::new(&params.serial_port, params.baud_rate)
                    .data_bits(DataBits::Eight)
                    .parity(Parity::None)
                    .stop_bits(StopBits::One)
                    .timeout(params.timeout());
                let port = SerialStream::open(&builder)
                    .map_err(|e| ProtocolError::Connection(e.to_string()))?;
                rtu::attach_slave(port, slave)
            }
        };

        self.ctx = Some(ctx);
        info!(
            parent: &self.span,
            endpoint = %params.endpoint(),
            unit_id = params.unit_id,
            "modbus connected"
        );
        Ok(())
    }

    /// 释放会话；未连接时无操作。
    pub async fn disconnect(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            if let Err(e) = ctx.disconnect().await {
                debug!(parent: &self.span, error = %e, "modbus disconnect returned error");
            }
            info!(parent: &self.span, "modbus disconnected");
        }
    }

    fn timeout(&self) -> Duration {
        self.params
            .as_ref()
            .map(ConnectionParams::timeout)
            .unwrap_or_else(|| ConnectionParams::default().timeout())
    }

    /// 传输层故障后会话不可再用，丢弃它以便重连。
    fn drop_on_transport_error(&mut self, err: &ProtocolError) {
        if matches!(
            err,
            ProtocolError::Io(_) | ProtocolError::Modbus(_) | ProtocolError::Timeout(_)
        ) && self.ctx.take().is_some()
        {
            warn!(parent: &self.span, error = %err, "modbus session dropped");
        }
    }
}

#[async_trait]
impl RegisterLink for DeviceLink {
    fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    async fn reconnect(&mut self) -> bool {
        match self.params.clone() {
            Some(params) => self.connect(&params).await,
            None => false,
        }
    }

    async fn read_block(
        &mut self,
        kind: RegisterKind,
        address: u16,
        count: u16,
    ) -> Result<RawWords, ProtocolError> {
        let timeout = self.timeout();
        let ctx = self.ctx.as_mut().ok_or(ProtocolError::NotConnected)?;

        let result = match kind {
            RegisterKind::Holding => with_timeout(
                timeout,
                "read holding registers",
                ctx.read_holding_registers(address, count),
            )
            .await
            .and_then(flatten)
            .map(RawWords::Registers),
            RegisterKind::Input => with_timeout(
                timeout,
                "read input registers",
                ctx.read_input_registers(address, count),
            )
            .await
            .and_then(flatten)
            .map(RawWords::Registers),
            RegisterKind::Coil => {
                with_timeout(timeout, "read coils", ctx.read_coils(address, count))
                    .await
                    .and_then(flatten)
                    .map(RawWords::Bits)
            }
            RegisterKind::Discrete => with_timeout(
                timeout,
                "read discrete inputs",
                ctx.read_discrete_inputs(address, count),
            )
            .await
            .and_then(flatten)
            .map(RawWords::Bits),
        };

        match result {
            Ok(mut words) => {
                // 线圈响应按字节补齐，截掉多余的位
                if let RawWords::Bits(bits) = &mut words {
                    bits.truncate(usize::from(count));
                }
                debug!(
                    parent: &self.span,
                    %kind,
                    address,
                    count,
                    received = words.len(),
                    "read modbus block"
                );
                Ok(words)
            }
            Err(e) => {
                self.drop_on_transport_error(&e);
                Err(e)
            }
        }
    }

    async fn write_block(&mut self, kind: RegisterKind, address: u16, value: u16) -> bool {
        let timeout = self.timeout();
        let Some(ctx) = self.ctx.as_mut() else {
            warn!(parent: &self.span, %kind, address, "write on disconnected link");
            return false;
        };

        let result = match kind {
            RegisterKind::Holding => with_timeout(
                timeout,
                "write single register",
                ctx.write_single_register(address, value),
            )
            .await
            .and_then(flatten),
            RegisterKind::Coil => with_timeout(
                timeout,
                "write single coil",
                ctx.write_single_coil(address, value != 0),
            )
            .await
            .and_then(flatten),
            RegisterKind::Input | RegisterKind::Discrete => {
                Err(ProtocolError::UnsupportedKind { op: "write", kind })
            }
        };

        match result {
            Ok(()) => {
                info!(parent: &self.span, %kind, address, value, "modbus write ok");
                true
            }
            Err(e) => {
                warn!(parent: &self.span, %kind, address, value, error = %e, "modbus write failed");
                self.drop_on_transport_error(&e);
                false
            }
        }
    }
}

/// 以超时包裹一次链路调用，超时与其他 I/O 失败同样处理。
async fn with_timeout<T, E, F>(
    timeout: Duration,
    op: &'static str,
    fut: F,
) -> Result<T, ProtocolError>
where
    F: Future<Output = Result<T, E>>,
    ProtocolError: From<E>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(ProtocolError::from),
        Err(_) => Err(ProtocolError::Timeout(format!(
            "{} after {}s",
            op,
            timeout.as_secs()
        ))),
    }
}

/// 展开 Modbus 异常响应。
fn flatten<T>(response: Result<T, ExceptionCode>) -> Result<T, ProtocolError> {
    response.map_err(|code| ProtocolError::Exception(format!("{:?}", code)))
}

fn connection_error(err: ProtocolError) -> ProtocolError {
    match err {
        ProtocolError::Io(e) => ProtocolError::Connection(e.to_string()),
        other => other,
    }
}
