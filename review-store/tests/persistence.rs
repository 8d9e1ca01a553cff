//! Round-trip and restart persistence for the store layer.

use review_store::reviews::ReviewFilter;
use review_store::{
    audit, messages, reviews, time, Category, EventType, Priority, Review, ReviewStatus,
    SenderRole, Store,
};
use serde_json::json;

fn sample_review(id: &str, priority: Priority) -> Review {
    let now = time::now_rfc3339_ms();
    Review {
        id: id.to_string(),
        status: ReviewStatus::Pending,
        intent: "Refactor logger".into(),
        description: Some("long body".into()),
        diff: Some("--- a/x\n+++ b/x\n".into()),
        affected_files: vec!["x".into()],
        skip_diff_validation: false,
        agent_type: "gsd-executor".into(),
        agent_role: "proposer".into(),
        phase: "4".into(),
        plan: Some("1".into()),
        task: Some("2".into()),
        project: "/repo".into(),
        category: Some(Category::CodeChange),
        priority,
        current_round: 1,
        claimed_by: None,
        claim_generation: 0,
        verdict_reason: None,
        counter_patch: None,
        counter_patch_affected_files: None,
        counter_patch_status: None,
        created_at: now.clone(),
        updated_at: now,
    }
}

async fn insert(store: &Store, review: &Review) {
    let txn = store.begin_write().await.expect("begin");
    reviews::insert(&txn, review).expect("insert");
    txn.commit().expect("commit");
}

#[tokio::test]
async fn review_round_trips_every_field() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");

    let review = sample_review("r-1", Priority::Normal);
    insert(&store, &review).await;

    let conn = store.read().await;
    let loaded = reviews::get(&conn, "r-1").expect("get").expect("present");
    assert_eq!(
        serde_json::to_value(&review).unwrap(),
        serde_json::to_value(&loaded).unwrap()
    );
}

#[tokio::test]
async fn rows_and_events_survive_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broker.sqlite3");

    {
        let store = Store::open(&path).expect("open");
        let review = sample_review("r-1", Priority::Critical);
        let txn = store.begin_write().await.expect("begin");
        reviews::insert(&txn, &review).expect("insert");
        audit::append(
            &txn,
            "r-1",
            EventType::ReviewCreated,
            "proposer",
            &json!({ "status": "pending" }),
            &review.created_at,
        )
        .expect("append");
        txn.commit().expect("commit");
        store.checkpoint_truncate().await.expect("checkpoint");
    }

    let store = Store::open(&path).expect("reopen");
    let conn = store.read().await;
    let loaded = reviews::get(&conn, "r-1").expect("get").expect("present");
    assert_eq!(loaded.priority, Priority::Critical);
    let events = audit::for_review(&conn, "r-1").expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::ReviewCreated);
    assert_eq!(events[0].metadata["status"], "pending");
}

#[tokio::test]
async fn listing_orders_by_priority_then_age() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");

    let mut low = sample_review("r-low", Priority::Low);
    low.created_at = "2026-01-01T00:00:00.000Z".into();
    let mut crit = sample_review("r-crit", Priority::Critical);
    crit.created_at = "2026-01-03T00:00:00.000Z".into();
    let mut norm_old = sample_review("r-norm-old", Priority::Normal);
    norm_old.created_at = "2026-01-01T00:00:00.000Z".into();
    let mut norm_new = sample_review("r-norm-new", Priority::Normal);
    norm_new.created_at = "2026-01-02T00:00:00.000Z".into();

    for r in [&low, &crit, &norm_old, &norm_new] {
        insert(&store, r).await;
    }

    let conn = store.read().await;
    let listed = reviews::list(&conn, &ReviewFilter::default()).expect("list");
    let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r-crit", "r-norm-old", "r-norm-new", "r-low"]);
}

#[tokio::test]
async fn same_millisecond_messages_keep_insertion_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");
    insert(&store, &sample_review("r-1", Priority::Normal)).await;

    let stamp = time::now_rfc3339_ms();
    let txn = store.begin_write().await.expect("begin");
    for (role, body) in [
        (SenderRole::Reviewer, "first"),
        (SenderRole::Proposer, "second"),
        (SenderRole::Reviewer, "third"),
    ] {
        messages::insert(&txn, "r-1", role, 1, body, None, &stamp).expect("insert");
    }
    txn.commit().expect("commit");

    let conn = store.read().await;
    let listed = messages::list(&conn, "r-1", None).expect("list");
    let bodies: Vec<&str> = listed.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
    assert!(listed.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn conditional_claim_only_moves_pending_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");
    insert(&store, &sample_review("r-1", Priority::Normal)).await;

    let now = time::now_rfc3339_ms();
    let txn = store.begin_write().await.expect("begin");
    assert!(reviews::claim_pending(&txn, "r-1", "rev-a", &now).expect("first claim"));
    assert!(!reviews::claim_pending(&txn, "r-1", "rev-b", &now).expect("second claim"));
    txn.commit().expect("commit");

    let conn = store.read().await;
    let loaded = reviews::get(&conn, "r-1").expect("get").expect("present");
    assert_eq!(loaded.status, ReviewStatus::Claimed);
    assert_eq!(loaded.claimed_by.as_deref(), Some("rev-a"));
    assert_eq!(loaded.claim_generation, 1);
}

#[tokio::test]
async fn dropped_write_txn_rolls_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");

    {
        let txn = store.begin_write().await.expect("begin");
        reviews::insert(&txn, &sample_review("r-gone", Priority::Normal)).expect("insert");
        // No commit: the guard rolls back on drop.
    }

    let conn = store.read().await;
    assert!(reviews::get(&conn, "r-gone").expect("get").is_none());
}

#[tokio::test]
async fn stats_pair_consecutive_state_events() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("broker.sqlite3")).expect("open");
    insert(&store, &sample_review("r-1", Priority::Normal)).await;

    // pending for 2s, claimed for 3s, then approved (open-ended).
    let txn = store.begin_write().await.expect("begin");
    audit::append(
        &txn,
        "r-1",
        EventType::ReviewCreated,
        "proposer",
        &json!({ "status": "pending" }),
        "2026-01-01T00:00:00.000Z",
    )
    .expect("e1");
    audit::append(
        &txn,
        "r-1",
        EventType::Claimed,
        "rev-a",
        &json!({ "status": "claimed" }),
        "2026-01-01T00:00:02.000Z",
    )
    .expect("e2");
    audit::append(
        &txn,
        "r-1",
        EventType::VerdictSubmitted,
        "rev-a",
        &json!({ "status": "approved", "verdict": "approved", "has_counter_patch": false }),
        "2026-01-01T00:00:05.000Z",
    )
    .expect("e3");
    txn.commit().expect("commit");

    let conn = store.read().await;
    let stats = audit::stats(&conn, None).expect("stats");
    assert_eq!(stats.total_verdicts, 1);
    assert_eq!(stats.approved_verdicts, 1);
    assert_eq!(stats.approval_rate, Some(1.0));

    let pending = stats.avg_secs_in_state["pending"];
    assert!((pending - 2.0).abs() < 0.05, "pending occupancy ~2s, got {pending}");
    let claimed = stats.avg_secs_in_state["claimed"];
    assert!((claimed - 3.0).abs() < 0.05, "claimed occupancy ~3s, got {claimed}");
    // approved never ended; it must not appear.
    assert!(!stats.avg_secs_in_state.contains_key("approved"));

    let to_verdict = stats.avg_secs_to_verdict.expect("present");
    assert!((to_verdict - 5.0).abs() < 0.05, "creation→verdict ~5s, got {to_verdict}");
}
