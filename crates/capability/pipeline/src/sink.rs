//! 信号批次下游。

use crate::error::SinkError;
use async_trait::async_trait;
use domain::SignalBatch;
use mbmon_storage::SignalStore;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 信号批次下游抽象，按轮询顺序逐批调用。
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn publish(&self, batch: &SignalBatch) -> Result<(), SinkError>;
}

/// 通过 broadcast 通道推送给在线订阅者，慢订阅者只会丢消息，不阻塞轮询。
#[derive(Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<SignalBatch>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SignalBatch> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl SignalSink for BroadcastSink {
    async fn publish(&self, batch: &SignalBatch) -> Result<(), SinkError> {
        self.sender
            .send(batch.clone())
            .map(|_| ())
            .map_err(|_| SinkError::NoSubscribers)
    }
}

/// 写入信号历史存储。
pub struct StoreSignalSink {
    store: Arc<dyn SignalStore>,
}

impl StoreSignalSink {
    pub fn new(store: Arc<dyn SignalStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SignalSink for StoreSignalSink {
    async fn publish(&self, batch: &SignalBatch) -> Result<(), SinkError> {
        self.store.save_signals(&batch.signals).await?;
        Ok(())
    }
}
