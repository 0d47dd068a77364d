use async_trait::async_trait;
use domain::{
    AlertRule, AlertType, ConnectionParams, DataFormat, PollSettings, RegisterKind, Severity,
};
use mbmon_alerts::AlertEngine;
use mbmon_pipeline::{BroadcastSink, PollError, PollLoop, StoreSignalSink};
use mbmon_protocol::{DeviceLink, ProtocolError, RawWords, RegisterLink, SignalAcquirer};
use mbmon_storage::{EventKind, EventStore, InMemoryHistoryStore, SignalStore};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::Span;

/// 固定返回同一组寄存器的链路；`panic_on` 指定第几次读取时 panic。
struct FixedLink {
    words: Vec<u16>,
    reads: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<(RegisterKind, u16, u16)>>>,
    panic_on: Option<usize>,
}

impl FixedLink {
    fn new(words: Vec<u16>) -> Self {
        Self {
            words,
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(Mutex::new(Vec::new())),
            panic_on: None,
        }
    }
}

#[async_trait]
impl RegisterLink for FixedLink {
    fn is_connected(&self) -> bool {
        true
    }

    async fn read_block(
        &mut self,
        _kind: RegisterKind,
        _address: u16,
        count: u16,
    ) -> Result<RawWords, ProtocolError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on == Some(n) {
            panic!("scripted read panic");
        }
        Ok(RawWords::Registers(
            self.words.iter().copied().take(usize::from(count)).collect(),
        ))
    }

    async fn write_block(&mut self, kind: RegisterKind, address: u16, value: u16) -> bool {
        self.writes.lock().await.push((kind, address, value));
        kind.is_writable()
    }
}

fn settings(count: u16, format: DataFormat) -> PollSettings {
    PollSettings {
        start_address: 0,
        count,
        register_type: RegisterKind::Holding,
        data_format: format,
        interval_ms: 100,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn unreachable_device_counts_errors_only() {
    let mut link = DeviceLink::new(Span::none());
    let params = ConnectionParams {
        timeout_secs: 1,
        ..ConnectionParams::tcp("127.0.0.1", 1)
    };
    assert!(!link.connect(&params).await);

    let mut engine = AlertEngine::new(Span::none());
    engine
        .add_rule(AlertRule::new("Signal 1", AlertType::ConnectionLost, None, Severity::Critical))
        .expect("rule");
    let engine = Arc::new(Mutex::new(engine));

    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine.clone()).build();
    poll.start(settings(5, DataFormat::U16)).expect("start");
    wait_until(|| poll.counters().error_count >= 3).await;
    poll.stop_and_wait().await;

    let counters = poll.counters();
    assert_eq!(counters.read_count, 0);
    assert!(counters.error_count >= 3);
    assert_eq!(counters.last_success_ms, None);
    assert!(!poll.is_connected());
    assert!(poll.latest().is_none());
    assert_eq!(engine.lock().await.history_len(), 0);
}

#[tokio::test]
async fn successful_polls_feed_alerts_and_sinks() {
    let store = Arc::new(InMemoryHistoryStore::new());
    let broadcast = Arc::new(BroadcastSink::new(16));
    let mut rx = broadcast.subscribe();

    let mut engine = AlertEngine::new(Span::none());
    engine
        .add_rule(AlertRule::new(
            "Signal 2",
            AlertType::ThresholdHigh,
            Some(100.0),
            Severity::Warning,
        ))
        .expect("rule");
    let engine = Arc::new(Mutex::new(engine));

    let link = FixedLink::new(vec![16963, 0, 17144, 32768]);
    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine.clone())
        .sink(broadcast.clone())
        .sink(Arc::new(StoreSignalSink::new(store.clone())))
        .events(store.clone())
        .build();

    poll.start(settings(2, DataFormat::F32)).expect("start");
    let batch = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("batch in time")
        .expect("batch");
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.signals[0].value.as_f64(), 48.75);
    assert_eq!(batch.signals[1].value.as_f64(), 124.25);

    wait_until(|| poll.counters().read_count >= 2).await;
    poll.stop_and_wait().await;
    assert!(!poll.is_running());

    let counters = poll.counters();
    assert_eq!(counters.error_count, 0);
    assert!(counters.last_success_ms.is_some());
    assert!(poll.latest().is_some());

    let engine = engine.lock().await;
    assert_eq!(engine.history_len() as u64, counters.read_count);
    assert!(engine.history().iter().all(|a| a.signal_name == "Signal 2"));

    let history = store.signal_history("Signal 1", 5).await.expect("history");
    assert_eq!(history.len() as u64, counters.read_count);

    let events = store.events(1).await.expect("events");
    let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&EventKind::PollStart));
    assert!(kinds.contains(&EventKind::PollStop));
}

#[tokio::test]
async fn second_start_is_rejected() {
    let engine = Arc::new(Mutex::new(AlertEngine::new(Span::none())));
    let link = FixedLink::new(vec![1, 2, 3]);
    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine).build();

    poll.start(settings(3, DataFormat::U16)).expect("start");
    assert!(poll.is_running());
    assert_eq!(
        poll.start(settings(3, DataFormat::U16)),
        Err(PollError::AlreadyRunning)
    );

    poll.stop_and_wait().await;
    assert!(!poll.is_running());
    poll.start(settings(3, DataFormat::U16)).expect("restart");
    poll.stop_and_wait().await;
}

#[tokio::test]
async fn invalid_settings_rejected_at_start() {
    let engine = Arc::new(Mutex::new(AlertEngine::new(Span::none())));
    let link = FixedLink::new(vec![1]);
    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine).build();

    let mut bad = settings(1, DataFormat::U16);
    bad.interval_ms = 10;
    assert!(matches!(poll.start(bad), Err(PollError::Settings(_))));
    assert!(!poll.is_running());
}

#[tokio::test]
async fn panicking_iteration_does_not_stop_loop() {
    let engine = Arc::new(Mutex::new(AlertEngine::new(Span::none())));
    let mut link = FixedLink::new(vec![7, 8]);
    link.panic_on = Some(1);
    let reads = link.reads.clone();
    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine).build();

    poll.start(settings(2, DataFormat::U16)).expect("start");
    wait_until(|| poll.counters().read_count >= 1).await;
    poll.stop_and_wait().await;

    let counters = poll.counters();
    assert_eq!(counters.error_count, 1);
    assert!(reads.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn writes_go_through_the_link() {
    let engine = Arc::new(Mutex::new(AlertEngine::new(Span::none())));
    let link = FixedLink::new(vec![0]);
    let writes = link.writes.clone();
    let poll = PollLoop::builder(SignalAcquirer::new(link, Span::none()), engine).build();

    assert!(poll.write(RegisterKind::Holding, 10, 1234).await);
    assert!(poll.write(RegisterKind::Coil, 3, 1).await);
    assert!(!poll.write(RegisterKind::Input, 3, 1).await);
    assert_eq!(writes.lock().await.len(), 3);
}
