use domain::{
    AlertRule, AlertType, ConnectionParams, DataFormat, PollSettings, RegisterKind,
    SettingsError, Severity, SignalStatus, SignalValue, StatusPolicy,
};

#[test]
fn physical_count_doubles_for_f32_registers() {
    let settings = PollSettings {
        count: 3,
        data_format: DataFormat::F32,
        ..PollSettings::default()
    };
    assert_eq!(settings.physical_count(), 6);

    let settings = PollSettings {
        count: 3,
        data_format: DataFormat::S16,
        ..PollSettings::default()
    };
    assert_eq!(settings.physical_count(), 3);
}

#[test]
fn physical_count_ignores_format_for_bits() {
    let settings = PollSettings {
        count: 4,
        register_type: RegisterKind::Coil,
        data_format: DataFormat::F32,
        ..PollSettings::default()
    };
    assert_eq!(settings.physical_count(), 4);
}

#[test]
fn validate_rejects_short_interval() {
    let settings = PollSettings {
        interval_ms: 50,
        ..PollSettings::default()
    };
    assert_eq!(
        settings.validate(),
        Err(SettingsError::IntervalTooShort(50))
    );
}

#[test]
fn validate_rejects_oversized_f32_read() {
    let settings = PollSettings {
        count: 63,
        data_format: DataFormat::F32,
        ..PollSettings::default()
    };
    let err = settings.validate().expect_err("126 registers");
    assert!(matches!(err, SettingsError::ReadTooLarge { physical: 126, .. }));

    let settings = PollSettings {
        count: 62,
        data_format: DataFormat::F32,
        ..PollSettings::default()
    };
    assert!(settings.validate().is_ok());
}

#[test]
fn validate_rejects_zero_count_and_bad_unit() {
    let settings = PollSettings {
        count: 0,
        ..PollSettings::default()
    };
    assert_eq!(settings.validate(), Err(SettingsError::EmptyCount));

    let params = ConnectionParams {
        unit_id: 0,
        ..ConnectionParams::default()
    };
    assert_eq!(params.validate(), Err(SettingsError::UnitIdOutOfRange(0)));
    assert!(ConnectionParams::tcp("10.0.0.5", 502).validate().is_ok());
}

#[test]
fn validate_rejects_zero_timeout() {
    let params = ConnectionParams {
        timeout_secs: 0,
        ..ConnectionParams::default()
    };
    assert_eq!(params.validate(), Err(SettingsError::ZeroTimeout));
}

#[test]
fn status_policy_flags_sentinel_and_magnitude() {
    let policy = StatusPolicy::default();
    assert_eq!(
        policy.classify(&SignalValue::Float(-9999.0)),
        SignalStatus::Error
    );
    assert_eq!(
        policy.classify(&SignalValue::Float(1_000_000.0)),
        SignalStatus::Error
    );
    assert_eq!(
        policy.classify(&SignalValue::Float(999_999.0)),
        SignalStatus::Ok
    );
    assert_eq!(policy.classify(&SignalValue::Int(-1)), SignalStatus::Ok);
    assert_eq!(
        policy.classify(&SignalValue::Float(f64::NAN)),
        SignalStatus::Error
    );
    assert_eq!(policy.classify(&SignalValue::Bool(true)), SignalStatus::Ok);

    let custom = StatusPolicy {
        sentinel: 0.0,
        max_magnitude: 100.0,
    };
    assert_eq!(custom.classify(&SignalValue::Int(0)), SignalStatus::Error);
    assert_eq!(custom.classify(&SignalValue::Int(101)), SignalStatus::Error);
}

#[test]
fn alert_rule_parses_with_defaults() {
    let json = r#"{"signal_name": "Signal 1", "alert_type": "threshold_high", "threshold": 50}"#;
    let rule: AlertRule = serde_json::from_str(json).expect("rule");
    assert_eq!(rule.alert_type, AlertType::ThresholdHigh);
    assert_eq!(rule.threshold, Some(50.0));
    assert!(rule.enabled);
    assert_eq!(rule.severity, Severity::Warning);
}

#[test]
fn enum_names_parse() {
    assert_eq!("coil".parse::<RegisterKind>(), Ok(RegisterKind::Coil));
    assert_eq!("F32".parse::<DataFormat>(), Ok(DataFormat::F32));
    assert!("float64".parse::<DataFormat>().is_err());
}
