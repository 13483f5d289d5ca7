//! HealthCheck: probe, then restore on failure

use std::time::Duration;

use crate::common::*;

#[test]
fn healthy_probe_triggers_nothing() {
    let h = Harness::new(records(2));
    h.reconciler.export().unwrap();

    for _ in 0..3 {
        assert!(h.reconciler.health_check().is_healthy());
    }

    assert_eq!(h.primary.probe_calls(), 3);
    assert_eq!(h.primary.create_calls(), 0);
    assert!(!h.primary.has_collection(RESTORED));
}

#[test]
fn each_failed_probe_triggers_one_restore() {
    let h = Harness::new(records(4));
    h.reconciler.export().unwrap();
    h.primary.drop_collection(LIVE);

    for expected in 1..=3 {
        let status = h.reconciler.health_check();
        match status {
            HealthStatus::Unhealthy { cause, restore } => {
                assert_eq!(cause.kind(), ErrorKind::NotFound);
                assert_eq!(restore.written(), Some(4));
            }
            HealthStatus::Healthy => panic!("dropped collection reported healthy"),
        }
        assert_eq!(h.primary.create_calls(), expected);
        assert_eq!(h.primary.bulk_add_calls(), expected);
    }
    assert_eq!(h.primary.records(RESTORED).unwrap(), records(4));
}

#[test]
fn outage_reports_failed_restore() {
    let h = Harness::new(records(1));
    h.reconciler.export().unwrap();
    h.primary.set_available(false);

    let status = h.reconciler.health_check();

    assert!(matches!(
        status,
        HealthStatus::Unhealthy {
            restore: RestoreOutcome::Failed(_),
            ..
        }
    ));
    assert_eq!(h.primary.delete_calls(), 1);
}

#[test]
fn unhealthy_with_empty_backup_restores_nothing() {
    let h = Harness::new(vec![]);
    h.primary.drop_collection(LIVE);

    let status = h.reconciler.health_check();

    assert!(!status.is_healthy());
    assert_eq!(h.primary.create_calls(), 0);
}

#[test]
fn cooldown_limits_triggered_restores() {
    let config = ReconcilerConfig {
        restore_cooldown: Some(Duration::from_secs(600)),
        ..ReconcilerConfig::default()
    };
    let h = Harness::with_config(records(2), config);
    h.reconciler.export().unwrap();
    h.primary.drop_collection(LIVE);

    assert!(!h.reconciler.health_check().is_healthy());
    let second = h.reconciler.health_check();

    assert_eq!(h.primary.create_calls(), 1);
    match second {
        HealthStatus::Unhealthy {
            restore: RestoreOutcome::Suppressed { retry_in },
            ..
        } => assert!(retry_in <= Duration::from_secs(600)),
        other => panic!("expected suppressed restore, got {:?}", other),
    }
}
