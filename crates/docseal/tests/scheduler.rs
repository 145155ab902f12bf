//! Scheduler lifecycle, tick accounting and reporting.

use std::time::Duration;

use docseal::{
    LogLevel, SchedulerConfig, SchedulerConfigUpdate, SignatureStatus, StatsSnapshot,
};
use docseal_testkit::fixtures::TestHarness;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Poll `cond` every 10ms for up to 5s.
async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_start_twice_arms_one_timer() {
    init_tracing();
    let h = TestHarness::new();
    let scheduler = h.scheduler(h.scheduler_config());

    assert!(scheduler.start());
    assert!(!scheduler.start());
    assert!(scheduler.is_running());

    wait_for(|| scheduler.stats().total_ticks >= 1).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = scheduler.stats();
    assert_eq!(stats.total_ticks, 1);
    assert_eq!(stats.skipped_ticks, 0);
    assert!(scheduler
        .log_history(50)
        .unwrap()
        .iter()
        .any(|line| line.contains("[WARN] scheduler already running")));

    assert!(scheduler.stop_and_wait().await);
    assert!(!scheduler.is_running());
    assert!(!scheduler.stop());
}

#[tokio::test]
async fn test_first_tick_signs_and_verifies() {
    let h = TestHarness::new();
    h.write_document("a.pdf", b"a");
    h.write_document("b.pdf", b"b");
    h.write_raw("c.pdf", b"not a pdf");
    let scheduler = h.scheduler(h.scheduler_config());

    scheduler.start();
    wait_for(|| scheduler.stats().total_ticks >= 1).await;
    scheduler.stop_and_wait().await;

    let stats = scheduler.stats();
    assert_eq!(stats.signatures_created, 2);
    assert_eq!(stats.documents_processed, 3);
    assert_eq!(stats.verifications_completed, 1);
    assert_eq!(stats.errors, 0);
    assert!(stats.last_check_at.is_some());

    let records = h.registry.records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == SignatureStatus::Verified));
}

#[tokio::test]
async fn test_timer_keeps_ticking_until_stopped() {
    let h = TestHarness::new();
    let scheduler = h.scheduler(SchedulerConfig {
        interval: Duration::from_millis(30),
        ..h.scheduler_config()
    });

    scheduler.start();
    wait_for(|| scheduler.stats().total_ticks >= 3).await;
    assert!(scheduler.stop_and_wait().await);

    let ticks = scheduler.stats().total_ticks;
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(scheduler.stats().total_ticks, ticks);
}

#[tokio::test]
async fn test_force_check_runs_when_stopped() {
    let h = TestHarness::new();
    h.write_document("forced.pdf", b"forced");
    let scheduler = h.scheduler(h.scheduler_config());

    let report = scheduler.force_check().await;
    assert_eq!(report.tick, 1);
    assert_eq!(report.pending, 1);
    assert_eq!(report.signatures_created, 1);
    assert_eq!(report.verified, 1);
    assert_eq!(report.error, None);
    assert!(!scheduler.is_running());

    let second = scheduler.force_check().await;
    assert_eq!(second.tick, 2);
    assert_eq!(second.pending, 0);
    assert_eq!(scheduler.stats().signatures_created, 1);
}

#[tokio::test]
async fn test_auto_flags_disable_phases() {
    let h = TestHarness::new();
    h.write_document("idle.pdf", b"idle");
    let scheduler = h.scheduler(SchedulerConfig {
        auto_sign: false,
        auto_verify: false,
        ..h.scheduler_config()
    });

    let report = scheduler.force_check().await;
    assert_eq!(report.pending, 1);
    assert_eq!(report.signatures_created, 0);
    assert_eq!(h.registry.records().await.unwrap().len(), 0);
    assert_eq!(scheduler.stats().verifications_completed, 0);

    scheduler.update_config(&SchedulerConfigUpdate {
        auto_sign: Some(true),
        ..SchedulerConfigUpdate::default()
    });
    assert_eq!(scheduler.force_check().await.signatures_created, 1);
    assert_eq!(
        h.registry.records().await.unwrap()[0].status,
        SignatureStatus::Signed
    );
}

#[tokio::test]
async fn test_tick_error_is_counted_not_raised() {
    init_tracing();
    let h = TestHarness::new();
    let blocker = h.dir.path().join("blocker");
    std::fs::write(&blocker, b"file, not a directory").unwrap();
    let scheduler = h.scheduler(SchedulerConfig {
        stats_file: blocker.join("status.json"),
        ..h.scheduler_config()
    });

    let report = scheduler.force_check().await;
    assert!(report.error.is_some());
    assert_eq!(scheduler.stats().errors, 1);

    let second = scheduler.force_check().await;
    assert!(second.error.is_some());
    assert_eq!(scheduler.stats().errors, 2);
    assert_eq!(scheduler.stats().total_ticks, 2);

    assert!(scheduler
        .log_history(100)
        .unwrap()
        .iter()
        .any(|line| line.contains("[ERROR] check #1 failed")));
}

#[tokio::test]
async fn test_ledger_outage_fails_records_without_tick_error() {
    init_tracing();
    let h = TestHarness::new();
    h.write_document("outage.pdf", b"outage");
    let scheduler = h.scheduler(h.scheduler_config());
    scheduler.force_check().await;

    h.ledger.set_failing(true);
    h.write_document("late.pdf", b"late");
    let report = scheduler.force_check().await;
    assert_eq!(report.error, None);
    assert_eq!(report.sign_failures, 1);
    assert_eq!(report.verify_failures, 1);

    let status = scheduler.status().await.unwrap();
    assert_eq!(status.registry.failed, 1);
    assert_eq!(status.registry.pending, 1);
    assert_eq!(status.stats.errors, 0);
    assert!(!status.services.ledger);
    assert!(status.services.content_store);

    h.ledger.set_failing(false);
    assert!(scheduler.status().await.unwrap().services.all_reachable());
}

#[tokio::test]
async fn test_stats_snapshot_written_each_tick() {
    let h = TestHarness::new();
    h.write_document("snap.pdf", b"snap");
    let config = h.scheduler_config();
    let scheduler = h.scheduler(config.clone());

    scheduler.force_check().await;
    let snapshot: StatsSnapshot =
        serde_json::from_slice(&std::fs::read(&config.stats_file).unwrap()).unwrap();
    assert_eq!(snapshot.monitoring.total_ticks, 1);
    assert_eq!(snapshot.registry.total, 1);
    assert_eq!(snapshot.registry.verified, 1);
    assert_eq!(snapshot.config, config);
}

#[tokio::test]
async fn test_export_never_overwrites() {
    let h = TestHarness::new();
    let config = h.scheduler_config();
    let scheduler = h.scheduler(config.clone());
    scheduler.force_check().await;

    let first = scheduler.export_stats().await.unwrap();
    let second = scheduler.export_stats().await.unwrap();
    assert_ne!(first, second);
    for path in [&first, &second] {
        assert!(path.starts_with(&config.export_dir));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("monitoring-export-") && name.ends_with(".json"));
        let snapshot: StatsSnapshot =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(snapshot.monitoring.total_ticks, 1);
    }
}

#[tokio::test]
async fn test_status_reports_running_state() {
    let h = TestHarness::new();
    h.write_document("pending.pdf", b"pending");
    let scheduler = h.scheduler(SchedulerConfig {
        auto_sign: false,
        ..h.scheduler_config()
    });

    let idle = scheduler.status().await.unwrap();
    assert!(!idle.running);
    assert_eq!(idle.registry.pending, 1);
    assert!(!idle.config.auto_sign);
    assert!(idle.services.all_reachable());

    scheduler.start();
    assert!(scheduler.status().await.unwrap().running);
    scheduler.stop_and_wait().await;
}

#[tokio::test]
async fn test_log_history_and_cleanup() {
    let h = TestHarness::new();
    let scheduler = h.scheduler(SchedulerConfig {
        log_level: LogLevel::Debug,
        ..h.scheduler_config()
    });
    for _ in 0..3 {
        scheduler.force_check().await;
    }

    let all = scheduler.log_history(1000).unwrap();
    assert!(all.len() > 5);
    assert!(all.iter().all(|line| line.starts_with('[')));

    let removed = scheduler.clean_old_logs(5).unwrap();
    assert_eq!(removed, all.len() - 5);
    let kept = scheduler.log_history(1000).unwrap();
    assert_eq!(kept, all[all.len() - 5..].to_vec());
}

#[tokio::test]
async fn test_interval_change_applies_on_restart() {
    let h = TestHarness::new();
    let scheduler = h.scheduler(h.scheduler_config());
    scheduler.start();
    wait_for(|| scheduler.stats().total_ticks >= 1).await;

    let config = scheduler.update_config(&SchedulerConfigUpdate {
        interval: Some(Duration::from_millis(20)),
        ..SchedulerConfigUpdate::default()
    });
    assert_eq!(config.interval, Duration::from_millis(20));

    // The running timer keeps its hour-long period.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(scheduler.stats().total_ticks, 1);

    scheduler.stop_and_wait().await;
    scheduler.start();
    wait_for(|| scheduler.stats().total_ticks >= 3).await;
    scheduler.stop_and_wait().await;
}
