use domain::{
    AlertRecord, AlertType, Severity, Signal, SignalStatus, SignalValue, now_epoch_ms,
};
use mbmon_storage::{
    AlertStore, EventKind, EventRecord, EventStore, HistoryLimits, InMemoryHistoryStore,
    RetentionStore, SignalRecord, SignalStore,
};

const MINUTE_MS: i64 = 60 * 1000;

fn signal(name: &str, value: f64, ts_ms: i64) -> Signal {
    Signal {
        id: 0,
        address: 0,
        name: name.to_string(),
        value: SignalValue::Float(value),
        unit: "V".to_string(),
        status: SignalStatus::Ok,
        last_update_ms: ts_ms,
    }
}

fn alert(severity: Severity, ts_ms: i64) -> AlertRecord {
    AlertRecord {
        signal_name: "Signal 1".to_string(),
        alert_type: AlertType::ThresholdHigh,
        message: "Signal Signal 1 exceeded threshold: 60 > 50".to_string(),
        severity,
        value: Some(60.0),
        timestamp_ms: ts_ms,
    }
}

#[tokio::test]
async fn signal_history_filters_by_name_and_window() {
    let store = InMemoryHistoryStore::new();
    let now = now_epoch_ms();
    let saved = store
        .save_signals(&[
            signal("Signal 1", 1.0, now - 90 * MINUTE_MS),
            signal("Signal 1", 2.0, now - 10 * MINUTE_MS),
            signal("Signal 2", 3.0, now - 5 * MINUTE_MS),
            signal("Signal 1", 4.0, now - MINUTE_MS),
        ])
        .await
        .expect("save");
    assert_eq!(saved, 4);

    let history = store.signal_history("Signal 1", 60).await.expect("query");
    let values: Vec<SignalValue> = history.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![SignalValue::Float(2.0), SignalValue::Float(4.0)]);
}

#[tokio::test]
async fn signal_history_keeps_newest_500_oldest_first() {
    let store = InMemoryHistoryStore::new();
    let now = now_epoch_ms();
    for i in 0..600i64 {
        store
            .insert_signal_record(SignalRecord::from(&signal(
                "Signal 1",
                i as f64,
                now - 600 + i,
            )))
            .expect("insert");
    }

    let history = store.signal_history("Signal 1", 60).await.expect("query");
    assert_eq!(history.len(), 500);
    assert_eq!(history[0].value, SignalValue::Float(100.0));
    assert_eq!(history[499].value, SignalValue::Float(599.0));
    assert!(history.windows(2).all(|w| w[0].timestamp_ms <= w[1].timestamp_ms));
}

#[tokio::test]
async fn alerts_filter_by_severity_newest_first() {
    let store = InMemoryHistoryStore::new();
    let now = now_epoch_ms();
    store.save_alert(&alert(Severity::Warning, now - 3000)).await.expect("save");
    store.save_alert(&alert(Severity::Critical, now - 2000)).await.expect("save");
    store.save_alert(&alert(Severity::Warning, now - 1000)).await.expect("save");
    store
        .save_alert(&alert(Severity::Warning, now - 48 * 60 * MINUTE_MS))
        .await
        .expect("save");

    let all = store.alerts(24, None).await.expect("query");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].timestamp_ms, now - 1000);

    let warnings = store.alerts(24, Some(Severity::Warning)).await.expect("query");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|a| a.severity == Severity::Warning));
}

#[tokio::test]
async fn events_capped_at_100() {
    let store = InMemoryHistoryStore::new();
    for i in 0..120 {
        store
            .save_event(&EventRecord::now(EventKind::Connect, format!("connect {}", i)))
            .await
            .expect("save");
    }
    store
        .save_event(&EventRecord::now(EventKind::PollStop, "stopped"))
        .await
        .expect("save");

    let events = store.events(24).await.expect("query");
    assert_eq!(events.len(), 100);
}

#[tokio::test]
async fn collections_drop_oldest_beyond_limits() {
    let store = InMemoryHistoryStore::with_limits(HistoryLimits {
        signals: 3,
        alerts: 2,
        events: 2,
    });
    let now = now_epoch_ms();
    store
        .save_signals(&[
            signal("Signal 1", 1.0, now - 4000),
            signal("Signal 1", 2.0, now - 3000),
            signal("Signal 1", 3.0, now - 2000),
        ])
        .await
        .expect("save");
    store
        .save_signals(&[signal("Signal 1", 4.0, now - 1000)])
        .await
        .expect("save");
    assert_eq!(store.signal_count(), 3);
    let history = store.signal_history("Signal 1", 60).await.expect("query");
    let values: Vec<SignalValue> = history.iter().map(|r| r.value).collect();
    assert_eq!(
        values,
        vec![
            SignalValue::Float(2.0),
            SignalValue::Float(3.0),
            SignalValue::Float(4.0)
        ]
    );

    for offset in [3000, 2000, 1000] {
        store
            .save_alert(&alert(Severity::Warning, now - offset))
            .await
            .expect("save");
    }
    let alerts = store.alerts(24, None).await.expect("query");
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[1].timestamp_ms, now - 2000);

    for i in 0..5 {
        store
            .save_event(&EventRecord::now(EventKind::Connect, format!("connect {}", i)))
            .await
            .expect("save");
    }
    assert_eq!(store.event_count(), 2);
    let events = store.events(24).await.expect("query");
    assert!(events.iter().all(|e| e.message != "connect 0"));
}

#[tokio::test]
async fn cleanup_removes_old_records_everywhere() {
    let store = InMemoryHistoryStore::new();
    let now = now_epoch_ms();
    let old = now - 40 * 24 * 60 * MINUTE_MS;
    store
        .save_signals(&[signal("Signal 1", 1.0, old), signal("Signal 1", 2.0, now)])
        .await
        .expect("save");
    store.save_alert(&alert(Severity::Info, old)).await.expect("save");
    store.save_alert(&alert(Severity::Info, now)).await.expect("save");
    let mut stale = EventRecord::now(EventKind::Disconnect, "disconnected");
    stale.timestamp_ms = old;
    store.save_event(&stale).await.expect("save");
    store
        .save_event(&EventRecord::now(EventKind::Connect, "connected"))
        .await
        .expect("save");

    let removed = store.cleanup_older_than(30).await.expect("cleanup");
    assert_eq!(removed, 3);
    assert_eq!(store.signal_count(), 1);
    assert_eq!(store.alert_count(), 1);
    assert_eq!(store.event_count(), 1);
}

#[test]
fn signal_record_serializes_camel_case() {
    let record = SignalRecord::from(&signal("Signal 1", 1.5, 1_700_000_000_000));
    let json = serde_json::to_value(&record).expect("json");
    assert_eq!(json["signalName"], "Signal 1");
    assert_eq!(json["value"], 1.5);
    assert_eq!(json["timestampMs"], 1_700_000_000_000i64);
}
