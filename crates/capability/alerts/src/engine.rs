//! 告警规则引擎。

use crate::error::AlertError;
use crate::notify::NotifySink;
use domain::{AlertRecord, AlertRule, AlertType, Signal, SignalStatus, now_epoch_ms};
use mbmon_storage::AlertStore;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{Span, debug, info, warn};

/// 告警历史默认容量。
pub const DEFAULT_MAX_HISTORY: usize = 1000;
/// `get_active_alerts` 返回的条数。
pub const ACTIVE_ALERT_COUNT: usize = 10;

/// 告警引擎：独占规则表与告警历史。
///
/// 多个轮询循环共享时由调用方加锁（`check_signal` → `trigger_alert`
/// 是对历史的读改写）。
pub struct AlertEngine {
    rules: HashMap<String, Vec<AlertRule>>,
    history: VecDeque<AlertRecord>,
    max_history: usize,
    sinks: Vec<Arc<dyn NotifySink>>,
    store: Option<Arc<dyn AlertStore>>,
    span: Span,
}

impl AlertEngine {
    pub fn new(span: Span) -> Self {
        Self {
            rules: HashMap::new(),
            history: VecDeque::new(),
            max_history: DEFAULT_MAX_HISTORY,
            sinks: Vec::new(),
            store: None,
            span,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotifySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 添加规则；同一信号可挂多条规则，各自独立判定。
    pub fn add_rule(&mut self, rule: AlertRule) -> Result<(), AlertError> {
        if rule.alert_type == AlertType::Anomaly {
            return Err(AlertError::Unsupported(rule.alert_type));
        }
        info!(
            parent: &self.span,
            signal = %rule.signal_name,
            alert_type = %rule.alert_type,
            threshold = ?rule.threshold,
            "alert rule added"
        );
        self.rules
            .entry(rule.signal_name.clone())
            .or_default()
            .push(rule);
        Ok(())
    }

    /// 删除信号下所有该类型的规则，返回删除条数。信号条目保留为空列表。
    pub fn remove_rule(&mut self, signal_name: &str, alert_type: AlertType) -> usize {
        let Some(rules) = self.rules.get_mut(signal_name) else {
            return 0;
        };
        let before = rules.len();
        rules.retain(|rule| rule.alert_type != alert_type);
        let removed = before - rules.len();
        if removed > 0 {
            info!(
                parent: &self.span,
                signal = %signal_name,
                alert_type = %alert_type,
                removed,
                "alert rule removed"
            );
        }
        removed
    }

    /// 所有规则，按信号名排序。
    pub fn rules(&self) -> Vec<AlertRule> {
        let mut names: Vec<&String> = self.rules.keys().collect();
        names.sort();
        names
            .into_iter()
            .flat_map(|name| self.rules[name].iter().cloned())
            .collect()
    }

    pub fn rules_for(&self, signal_name: &str) -> Option<&[AlertRule]> {
        self.rules.get(signal_name).map(Vec::as_slice)
    }

    /// 用信号的当前值判定全部已启用规则，返回本次产生的告警。
    pub async fn check_signal(
        &mut self,
        signal_name: &str,
        value: f64,
        status: SignalStatus,
    ) -> Vec<AlertRecord> {
        let Some(rules) = self.rules.get(signal_name) else {
            return Vec::new();
        };
        let now_ms = now_epoch_ms();
        let fired: Vec<AlertRecord> = rules
            .iter()
            .filter(|rule| rule.enabled)
            .filter_map(|rule| evaluate(rule, signal_name, value, status, now_ms))
            .collect();

        for record in &fired {
            self.trigger_alert(record.clone()).await;
        }
        fired
    }

    /// 逐个信号判定一批数据。
    pub async fn check_signals(&mut self, signals: &[Signal]) -> Vec<AlertRecord> {
        let mut fired = Vec::new();
        for signal in signals {
            let records = self
                .check_signal(&signal.name, signal.value.as_f64(), signal.status)
                .await;
            fired.extend(records);
        }
        fired
    }

    /// 记录告警：写入历史、尽力持久化、通知所有出口。
    pub async fn trigger_alert(&mut self, record: AlertRecord) {
        self.history.push_back(record.clone());
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }

        if let Some(store) = &self.store {
            if let Err(e) = store.save_alert(&record).await {
                warn!(parent: &self.span, error = %e, "failed to persist alert");
            }
        }

        for sink in &self.sinks {
            if let Err(e) = sink.deliver(&record) {
                debug!(parent: &self.span, error = %e, "alert notification not delivered");
            }
        }
    }

    /// 最近 10 条告警，按时间先后排列。
    pub fn get_active_alerts(&self) -> Vec<AlertRecord> {
        let skip = self.history.len().saturating_sub(ACTIVE_ALERT_COUNT);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// 清空告警历史，规则不受影响。
    pub fn clear_alert_history(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> Vec<AlertRecord> {
        self.history.iter().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// 判定单条规则。阈值缺失的阈值规则永不触发。
fn evaluate(
    rule: &AlertRule,
    signal_name: &str,
    value: f64,
    status: SignalStatus,
    now_ms: i64,
) -> Option<AlertRecord> {
    let (message, value) = match rule.alert_type {
        AlertType::ThresholdHigh => match rule.threshold {
            Some(threshold) if value > threshold => (
                format!(
                    "Signal {} exceeded threshold: {} > {}",
                    signal_name, value, threshold
                ),
                Some(value),
            ),
            _ => return None,
        },
        AlertType::ThresholdLow => match rule.threshold {
            Some(threshold) if value < threshold => (
                format!(
                    "Signal {} below threshold: {} < {}",
                    signal_name, value, threshold
                ),
                Some(value),
            ),
            _ => return None,
        },
        AlertType::ConnectionLost if status == SignalStatus::Error => {
            (format!("Connection lost for signal {}", signal_name), None)
        }
        AlertType::ConnectionLost | AlertType::Anomaly => return None,
    };

    Some(AlertRecord {
        signal_name: signal_name.to_string(),
        alert_type: rule.alert_type,
        message,
        severity: rule.severity,
        value,
        timestamp_ms: now_ms,
    })
}
