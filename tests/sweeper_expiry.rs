//! Integration tests for time-driven expiry through the sweeper.

mod common;

use common::adapter::Call;
use common::{Harness, NOW};
use restrictd::restriction::{ExpireOutcome, RestrictionKind, RestrictionState, SubjectId};
use restrictd::store::RestrictionStore;
use restrictd::sweeper::{SweepReport, Sweeper};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn sweep_expires_only_due_entries() {
    let h = Harness::new().await;
    let sweeper = Sweeper::new(Arc::clone(&h.engine), Duration::from_secs(30));

    h.engine
        .impose_timed(SubjectId(1), RestrictionKind::Mute, NOW + 10)
        .await
        .unwrap();
    h.engine
        .impose_timed(SubjectId(2), RestrictionKind::NoHelp, NOW + 20)
        .await
        .unwrap();
    h.engine
        .impose_timed(SubjectId(3), RestrictionKind::NoTech, NOW + 3_600)
        .await
        .unwrap();
    h.engine.impose(SubjectId(4), RestrictionKind::Mute).await.unwrap();

    h.clock.advance(20);
    let report = sweeper.sweep_once(h.engine.now()).await;

    assert_eq!(
        report,
        SweepReport {
            expired: 2,
            already_resolved: 0,
            failed: 0
        }
    );
    let revokes: Vec<_> = h
        .adapter
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Revoke(..)))
        .collect();
    assert_eq!(
        revokes,
        vec![
            Call::Revoke(SubjectId(1), RestrictionKind::Mute),
            Call::Revoke(SubjectId(2), RestrictionKind::NoHelp),
        ]
    );
    assert!(h.store.list_due_timed(h.engine.now()).await.unwrap().is_empty());
    assert_eq!(
        h.engine.state(SubjectId(3), RestrictionKind::NoTech).await.unwrap(),
        RestrictionState::Timed {
            expires_at: NOW + 3_600
        }
    );
    assert_eq!(
        h.engine.state(SubjectId(4), RestrictionKind::Mute).await.unwrap(),
        RestrictionState::Permanent
    );
}

#[tokio::test]
async fn entries_resolved_after_listing_are_skipped() {
    let h = Harness::new().await;
    let (extended, lifted) = (SubjectId(10), SubjectId(11));

    h.engine
        .impose_timed(extended, RestrictionKind::HelpMute, NOW + 5)
        .await
        .unwrap();
    h.engine
        .impose_timed(lifted, RestrictionKind::NoHelp, NOW + 5)
        .await
        .unwrap();
    h.clock.advance(10);

    let due = h.store.list_due_timed(h.engine.now()).await.unwrap();
    assert_eq!(due.len(), 2);

    // Operators act between the listing and the expiry calls.
    h.engine
        .impose_timed(extended, RestrictionKind::HelpMute, NOW + 600)
        .await
        .unwrap();
    h.engine.lift(lifted, RestrictionKind::NoHelp).await.unwrap();
    let revokes_before = h.adapter.revokes();

    for entry in due {
        assert_eq!(
            h.engine.expire(entry.subject, entry.kind).await.unwrap(),
            ExpireOutcome::AlreadyResolved
        );
    }

    assert_eq!(h.adapter.revokes(), revokes_before);
    assert_eq!(
        h.engine.state(extended, RestrictionKind::HelpMute).await.unwrap(),
        RestrictionState::Timed {
            expires_at: NOW + 600
        }
    );
}

#[tokio::test]
async fn revoke_failures_are_counted_and_records_stay_removed() {
    let h = Harness::new().await;
    let sweeper = Sweeper::new(Arc::clone(&h.engine), Duration::from_secs(30));

    h.engine
        .impose_timed(SubjectId(5), RestrictionKind::NoArt, NOW + 1)
        .await
        .unwrap();
    h.adapter.fail_revokes(true);
    h.clock.advance(1);

    let report = sweeper.sweep_once(h.engine.now()).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.expired, 0);
    assert_eq!(
        h.engine.state(SubjectId(5), RestrictionKind::NoArt).await.unwrap(),
        RestrictionState::Absent
    );

    // Nothing left to retry from the store side.
    let again = sweeper.sweep_once(h.engine.now()).await;
    assert_eq!(again, SweepReport::default());
}

#[tokio::test]
async fn spawned_sweeper_runs_on_interval() {
    let h = Harness::new().await;
    h.engine
        .impose_timed(SubjectId(6), RestrictionKind::Mute, NOW + 1)
        .await
        .unwrap();
    h.clock.advance(5);

    let handle = Sweeper::new(Arc::clone(&h.engine), Duration::from_millis(20)).spawn();

    let mut lifted = false;
    for _ in 0..50 {
        if !h
            .engine
            .state(SubjectId(6), RestrictionKind::Mute)
            .await
            .unwrap()
            .is_active()
        {
            lifted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();

    assert!(lifted, "sweeper should lift the due restriction");
    assert_eq!(h.adapter.revokes(), 1);
}
