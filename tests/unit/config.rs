use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = LivestripConfig::from_json("{}").unwrap();
    assert_eq!(cfg, LivestripConfig::default());
    assert_eq!(cfg.recorder.timeslice, Duration::from_millis(200));
    assert_eq!(cfg.compositor.schedule.total_secs(), 15.0);
    assert_eq!(
        cfg.compositor.output_media_types[0].as_str(),
        "video/mp4"
    );
}

#[test]
fn durations_are_read_in_millis() {
    let cfg = LivestripConfig::from_json(
        r#"{"recorder":{"stop_timeout_ms":750},"compositor":{"metadata_timeout_ms":1500}}"#,
    )
    .unwrap();
    assert_eq!(cfg.recorder.stop_timeout, Duration::from_millis(750));
    assert_eq!(cfg.compositor.metadata_timeout, Duration::from_millis(1500));
}

#[test]
fn serialization_round_trips_millis_keys() {
    let json = serde_json::to_value(LivestripConfig::default()).unwrap();
    assert_eq!(json["recorder"]["settle_cap_ms"], 2000);
    assert_eq!(json["compositor"]["schedule"]["loop_count"], 3);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = LivestripConfig::from_json(r#"{"recorder":{"bogus":1}}"#).unwrap_err();
    assert!(matches!(err, LivestripError::Validation(_)));
}

#[test]
fn invalid_values_fail_validation() {
    assert!(LivestripConfig::from_json(r#"{"compositor":{"width":1081}}"#).is_err());
    assert!(LivestripConfig::from_json(r#"{"compositor":{"fps":0}}"#).is_err());
    assert!(
        LivestripConfig::from_json(r#"{"compositor":{"schedule":{"loop_count":0}}}"#).is_err()
    );
    assert!(
        LivestripConfig::from_json(r#"{"recorder":{"settle_min_ms":3000}}"#).is_err()
    );
}

#[test]
fn debounce_mirrors_settle_fields() {
    let d = RecorderConfig::default().debounce();
    assert_eq!(d.quiet, Duration::from_millis(100));
    assert_eq!(d.min_wait, Duration::from_millis(500));
    assert_eq!(d.cap, Duration::from_millis(2000));
}
