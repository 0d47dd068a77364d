//! 轮询循环
//!
//! 状态只有 Idle / Running 两种。运行期间每轮：采集 → 告警判定 →
//! 下游分发 → 等待 `interval_ms`。单轮失败只计数，不终止循环；
//! 单轮 panic 额外等待 1 秒，避免错误空转。

use crate::error::{PollError, SinkError};
use crate::sink::SignalSink;
use domain::{ConnectionParams, PollSettings, RegisterKind, SignalBatch};
use mbmon_alerts::AlertEngine;
use mbmon_protocol::{DeviceLink, RegisterLink, SignalAcquirer};
use mbmon_storage::{EventKind, EventRecord, EventStore};
use mbmon_telemetry::{PollCounters, PollMetrics};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{Span, debug, error, info, warn};

/// 单轮 panic 后的额外等待
const PANIC_BACKOFF: Duration = Duration::from_secs(1);

struct PollShared<L> {
    acquirer: Mutex<SignalAcquirer<L>>,
    alerts: Arc<Mutex<AlertEngine>>,
    sinks: Vec<Arc<dyn SignalSink>>,
    events: Option<Arc<dyn EventStore>>,
    metrics: Arc<PollMetrics>,
    connected: AtomicBool,
    latest: RwLock<Option<SignalBatch>>,
    span: Span,
}

impl<L> PollShared<L> {
    async fn record_event(&self, kind: EventKind, message: String) {
        if let Some(events) = &self.events {
            if let Err(e) = events.save_event(&EventRecord::now(kind, message)).await {
                warn!(
                    parent: &self.span,
                    event = kind.as_str(),
                    error = %e,
                    "failed to save event"
                );
            }
        }
    }
}

/// 单次运行的控制句柄，每次 start 新建。
struct RunControl {
    active: AtomicBool,
    wake: Notify,
}

struct RunHandle {
    task: JoinHandle<()>,
    control: Arc<RunControl>,
}

/// PollLoop 构建器
pub struct PollLoopBuilder<L> {
    acquirer: SignalAcquirer<L>,
    alerts: Arc<Mutex<AlertEngine>>,
    sinks: Vec<Arc<dyn SignalSink>>,
    events: Option<Arc<dyn EventStore>>,
    span: Span,
}

impl<L: RegisterLink + 'static> PollLoopBuilder<L> {
    pub fn sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventStore>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn build(self) -> PollLoop<L> {
        let connected = self.acquirer.is_connected();
        PollLoop {
            shared: Arc::new(PollShared {
                acquirer: Mutex::new(self.acquirer),
                alerts: self.alerts,
                sinks: self.sinks,
                events: self.events,
                metrics: Arc::new(PollMetrics::new()),
                connected: AtomicBool::new(connected),
                latest: RwLock::new(None),
                span: self.span,
            }),
            run: std::sync::Mutex::new(None),
        }
    }
}

/// 设备轮询循环，一个实例对应一条设备会话。
pub struct PollLoop<L> {
    shared: Arc<PollShared<L>>,
    run: std::sync::Mutex<Option<RunHandle>>,
}

impl<L: RegisterLink + 'static> PollLoop<L> {
    pub fn builder(
        acquirer: SignalAcquirer<L>,
        alerts: Arc<Mutex<AlertEngine>>,
    ) -> PollLoopBuilder<L> {
        PollLoopBuilder {
            acquirer,
            alerts,
            sinks: Vec::new(),
            events: None,
            span: Span::none(),
        }
    }

    fn lock_run(&self) -> std::sync::MutexGuard<'_, Option<RunHandle>> {
        self.run.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 启动后台轮询任务；已在运行时返回 `AlreadyRunning`。
    pub fn start(&self, settings: PollSettings) -> Result<(), PollError> {
        settings.validate()?;
        let mut run = self.lock_run();
        if run
            .as_ref()
            .is_some_and(|handle| handle.control.active.load(Ordering::Acquire))
        {
            return Err(PollError::AlreadyRunning);
        }

        let control = Arc::new(RunControl {
            active: AtomicBool::new(true),
            wake: Notify::new(),
        });
        let task = tokio::spawn(run_loop(self.shared.clone(), settings, control.clone()));
        *run = Some(RunHandle { task, control });
        Ok(())
    }

    /// 请求停止；循环在下一轮开始前退出，进行中的读取会完成。
    pub fn stop(&self) {
        let run = self.lock_run();
        if let Some(handle) = run.as_ref() {
            if handle.control.active.swap(false, Ordering::AcqRel) {
                handle.control.wake.notify_one();
                info!(parent: &self.shared.span, "poll loop stop requested");
            }
        }
    }

    /// 停止并等待后台任务退出。
    pub async fn stop_and_wait(&self) {
        self.stop();
        let handle = self.lock_run().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.task.await {
                warn!(parent: &self.shared.span, error = %e, "poll task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_run()
            .as_ref()
            .is_some_and(|handle| handle.control.active.load(Ordering::Acquire))
    }

    pub fn counters(&self) -> PollCounters {
        self.shared.metrics.snapshot()
    }

    pub fn metrics(&self) -> Arc<PollMetrics> {
        self.shared.metrics.clone()
    }

    /// 最近一轮采集后的链路状态。
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// 最近一次成功的信号批次。
    pub fn latest(&self) -> Option<SignalBatch> {
        self.shared
            .latest
            .read()
            .ok()
            .and_then(|latest| latest.clone())
    }

    pub fn alerts(&self) -> Arc<Mutex<AlertEngine>> {
        self.shared.alerts.clone()
    }

    /// 写单个保持寄存器或线圈。与轮询共用链路，排在进行中的读取之后。
    pub async fn write(&self, kind: RegisterKind, address: u16, value: u16) -> bool {
        let mut acquirer = self.shared.acquirer.lock().await;
        acquirer.link_mut().write_block(kind, address, value).await
    }
}

impl PollLoop<DeviceLink> {
    /// 用新参数重建设备会话。
    pub async fn connect(&self, params: &ConnectionParams) -> bool {
        let connected = {
            let mut acquirer = self.shared.acquirer.lock().await;
            acquirer.link_mut().connect(params).await
        };
        self.shared.connected.store(connected, Ordering::Release);
        if connected {
            self.shared
                .record_event(EventKind::Connect, format!("connected to {}", params.endpoint()))
                .await;
        }
        connected
    }

    /// 释放设备会话；不改变轮询状态。
    pub async fn disconnect(&self) {
        let endpoint = {
            let mut acquirer = self.shared.acquirer.lock().await;
            let endpoint = acquirer.link().params().map(ConnectionParams::endpoint);
            acquirer.link_mut().disconnect().await;
            endpoint
        };
        self.shared.connected.store(false, Ordering::Release);
        self.shared
            .record_event(
                EventKind::Disconnect,
                format!("disconnected from {}", endpoint.unwrap_or_default()),
            )
            .await;
    }
}

async fn run_loop<L: RegisterLink + 'static>(
    shared: Arc<PollShared<L>>,
    settings: PollSettings,
    control: Arc<RunControl>,
) {
    info!(
        parent: &shared.span,
        kind = %settings.register_type,
        format = %settings.data_format,
        start_address = settings.start_address,
        count = settings.count,
        interval_ms = settings.interval_ms,
        "poll loop started"
    );
    shared
        .record_event(
            EventKind::PollStart,
            format!(
                "polling {} {} x{} from {} every {}ms",
                settings.register_type,
                settings.data_format,
                settings.count,
                settings.start_address,
                settings.interval_ms
            ),
        )
        .await;

    while control.active.load(Ordering::Acquire) {
        let mut delay = settings.interval();
        let iteration = tokio::spawn(poll_once(shared.clone(), settings.clone()));
        if let Err(e) = iteration.await {
            shared.metrics.record_error();
            error!(parent: &shared.span, error = %e, "poll iteration aborted");
            delay += PANIC_BACKOFF;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = control.wake.notified() => {}
        }
    }

    shared
        .record_event(EventKind::PollStop, "polling stopped".to_string())
        .await;
    let counters = shared.metrics.snapshot();
    info!(
        parent: &shared.span,
        read_count = counters.read_count,
        error_count = counters.error_count,
        "poll loop stopped"
    );
}

/// 执行一轮；返回是否拿到数据。
async fn poll_once<L: RegisterLink>(shared: Arc<PollShared<L>>, settings: PollSettings) -> bool {
    let result = {
        let mut acquirer = shared.acquirer.lock().await;
        let result = acquirer.acquire(&settings).await;
        shared
            .connected
            .store(acquirer.is_connected(), Ordering::Release);
        result
    };

    let batch = match result {
        Ok(batch) if !batch.is_empty() => batch,
        Ok(_) => {
            shared.metrics.record_error();
            warn!(parent: &shared.span, "poll returned an empty batch");
            return false;
        }
        Err(e) => {
            shared.metrics.record_error();
            debug!(parent: &shared.span, error = %e, "poll iteration returned no data");
            return false;
        }
    };
    shared.metrics.record_read(batch.read_at_ms);

    let fired = shared.alerts.lock().await.check_signals(&batch.signals).await;
    if !fired.is_empty() {
        debug!(parent: &shared.span, alerts = fired.len(), "alerts raised");
    }

    for sink in &shared.sinks {
        match sink.publish(&batch).await {
            Ok(()) | Err(SinkError::NoSubscribers) => {}
            Err(e) => warn!(parent: &shared.span, error = %e, "signal sink failed"),
        }
    }

    if let Ok(mut latest) = shared.latest.write() {
        *latest = Some(batch);
    }
    true
}
