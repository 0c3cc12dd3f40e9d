use easel_sync::{FailureReason, SyncAction, SyncConfig, SyncError, SyncState, SyncTransport};
use easel_tree::Snapshot;
use std::time::{Duration, Instant};

fn snap(title: &str) -> Snapshot {
    Snapshot::element("main", "root").with_attr("title", title)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn retry_at(actions: &[SyncAction]) -> Option<Instant> {
    actions.iter().find_map(|a| match a {
        SyncAction::ScheduleRetry(at) => Some(*at),
        _ => None,
    })
}

fn ack_deadline(actions: &[SyncAction]) -> Option<Instant> {
    actions.iter().find_map(|a| match a {
        SyncAction::ScheduleAckTimeout(at) => Some(*at),
        _ => None,
    })
}

#[test]
fn test_timeouts_retry_then_roll_back() {
    let t0 = Instant::now();
    let mut transport = SyncTransport::new(&SyncConfig::default());
    transport.set_baseline(snap("good"));

    let actions = transport.submit(snap("bad"), t0);
    let mut deadline = ack_deadline(&actions).unwrap();
    assert_eq!(deadline, t0 + ms(2000));

    let mut retry_delays = Vec::new();
    for _ in 0..3 {
        let actions = transport.ack_timeout(deadline);
        let retry = retry_at(&actions).unwrap();
        retry_delays.push(retry - deadline);

        let actions = transport.resend(snap("bad"), retry);
        assert!(actions.contains(&SyncAction::Submit(snap("bad"))));
        deadline = ack_deadline(&actions).unwrap();
    }
    assert_eq!(retry_delays, vec![ms(100), ms(200), ms(400)]);

    let actions = transport.ack_timeout(deadline);
    assert_eq!(retry_at(&actions), None);
    assert_eq!(
        actions,
        vec![
            SyncAction::PersistPending(snap("bad")),
            SyncAction::Failed(SyncError::Terminal {
                attempts: 4,
                reason: FailureReason::Timeout,
            }),
            SyncAction::StatusChanged(SyncState::Failed),
            SyncAction::Rollback(snap("good")),
        ]
    );
    assert_eq!(transport.state(), SyncState::Failed);
    assert!(!transport.is_busy());
}

#[test]
fn test_no_retry_when_budget_is_zero() {
    let t0 = Instant::now();
    let config = SyncConfig {
        max_retries: 0,
        ..SyncConfig::default()
    };
    let mut transport = SyncTransport::new(&config);
    transport.set_baseline(snap("good"));
    transport.submit(snap("bad"), t0);

    let actions = transport.ack_failure(t0 + ms(10));
    assert!(actions.contains(&SyncAction::Rollback(snap("good"))));
    assert_eq!(retry_at(&actions), None);
}

#[test]
fn test_retry_success_resets_counter() {
    let t0 = Instant::now();
    let mut transport = SyncTransport::new(&SyncConfig::default());
    transport.set_baseline(snap("v0"));

    transport.submit(snap("v1"), t0);
    let retry = retry_at(&transport.ack_failure(t0 + ms(5))).unwrap();
    transport.resend(snap("v2"), retry);
    transport.ack_success(retry + ms(5));

    assert_eq!(transport.last_synced(), Some(&snap("v2")));
    assert_eq!(transport.attempt(), 0);
    assert_eq!(transport.state(), SyncState::Synced);

    // a fresh cycle starts from attempt one again
    transport.submit(snap("v3"), retry + ms(10));
    assert_eq!(transport.attempt(), 1);
}

#[test]
fn test_new_edit_after_terminal_failure_syncs_again() {
    let t0 = Instant::now();
    let config = SyncConfig {
        max_retries: 0,
        ..SyncConfig::default()
    };
    let mut transport = SyncTransport::new(&config);
    transport.set_baseline(snap("good"));
    transport.submit(snap("bad"), t0);
    transport.ack_failure(t0);

    let actions = transport.submit(snap("next"), t0 + ms(500));
    assert_eq!(actions[0], SyncAction::StatusChanged(SyncState::Syncing));
    assert!(transport.is_in_flight());
}
