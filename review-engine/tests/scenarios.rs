//! End-to-end verb scenarios against a real store file and a real scratch
//! working tree (dry-runs shell out to the actual `git` binary).

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use diff_validator::DiffValidator;
use review_engine::{Broker, BrokerError, CreateReviewInput, MessageInput, Verdict, VerdictInput};
use review_store::{CounterPatchStatus, EventType, ReviewStatus, SenderRole, Store};

const SEED: &str = "alpha\nbeta\ngamma\n";

const D1: &str = "\
--- a/app.txt
+++ b/app.txt
@@ -1,3 +1,3 @@
 alpha
-beta
+BETA
 gamma
";

const D2: &str = "\
--- a/app.txt
+++ b/app.txt
@@ -1,3 +1,3 @@
 alpha
-beta
+beta-two
 gamma
";

struct Rig {
    broker: Arc<Broker>,
    worktree: tempfile::TempDir,
    _store_dir: tempfile::TempDir,
}

fn rig() -> Rig {
    let worktree = tempfile::tempdir().expect("worktree");
    fs::write(worktree.path().join("app.txt"), SEED).expect("seed");
    let store_dir = tempfile::tempdir().expect("store dir");
    let store = Store::open(&store_dir.path().join("broker.sqlite3")).expect("open store");
    let broker = Arc::new(Broker::new(store, DiffValidator::new(worktree.path())));
    Rig {
        broker,
        worktree,
        _store_dir: store_dir,
    }
}

fn proposal(diff: Option<&str>) -> CreateReviewInput {
    CreateReviewInput {
        intent: "Refactor logger".into(),
        agent_type: "gsd-executor".into(),
        agent_role: "proposer".into(),
        phase: "4".into(),
        plan: Some("1".into()),
        task: Some("2".into()),
        category: Some(review_store::Category::CodeChange),
        diff: diff.map(str::to_string),
        ..Default::default()
    }
}

#[tokio::test]
async fn happy_path_approval() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    assert_eq!(created.status, ReviewStatus::Pending);
    assert_eq!(created.current_round, 1);

    let listed = broker
        .list_reviews(
            review_engine::queries::Filter {
                status: Some(ReviewStatus::Pending),
                ..Default::default()
            },
            false,
        )
        .await
        .expect("list");
    assert_eq!(listed.count, 1);
    assert_eq!(listed.reviews[0].claim_generation, 0);

    let claim = broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");
    assert_eq!(claim.status, ReviewStatus::Claimed);
    assert_eq!(claim.claim_generation, 1);

    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::Approved,
            notes: None,
            counter_patch: None,
            claim_generation: 1,
        })
        .await
        .expect("verdict");

    broker
        .close_review(&created.review_id, Some("proposer"))
        .await
        .expect("close");

    let timeline = broker
        .get_review_timeline(&created.review_id)
        .await
        .expect("timeline");
    let kinds: Vec<EventType> = timeline.events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        kinds,
        vec![
            EventType::ReviewCreated,
            EventType::Claimed,
            EventType::VerdictSubmitted,
            EventType::Closed,
        ]
    );

    let status = broker
        .get_review_status(&created.review_id, false, None)
        .await
        .expect("status");
    assert_eq!(status.summary.status, ReviewStatus::Closed);
    assert_eq!(status.summary.current_round, 1);
}

#[tokio::test]
async fn counter_patch_accept_swaps_the_proposal() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");
    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::ChangesRequested,
            notes: Some("prefer beta-two".into()),
            counter_patch: Some(D2.into()),
            claim_generation: 1,
        })
        .await
        .expect("verdict with counter-patch");

    let proposal_view = broker.get_proposal(&created.review_id).await.expect("get");
    assert_eq!(
        proposal_view.status.summary.counter_patch_status,
        Some(CounterPatchStatus::Pending)
    );

    broker
        .accept_counter_patch(&created.review_id)
        .await
        .expect("accept");

    let after = broker.get_proposal(&created.review_id).await.expect("get");
    assert_eq!(after.diff.as_deref(), Some(D2));
    assert_eq!(after.status.affected_files, vec!["app.txt".to_string()]);
    assert_eq!(after.counter_patch, None);
    assert_eq!(
        after.status.summary.counter_patch_status,
        Some(CounterPatchStatus::Accepted)
    );

    let timeline = broker
        .get_review_timeline(&created.review_id)
        .await
        .expect("timeline");
    let kinds: Vec<EventType> = timeline.events.iter().map(|e| e.event_type).collect();
    let submitted = kinds
        .iter()
        .position(|k| *k == EventType::CounterPatchSubmitted)
        .expect("submitted event");
    let accepted = kinds
        .iter()
        .position(|k| *k == EventType::CounterPatchAccepted)
        .expect("accepted event");
    assert!(submitted < accepted);
}

#[tokio::test]
async fn stale_counter_patch_changes_nothing() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");
    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::ChangesRequested,
            notes: Some("prefer beta-two".into()),
            counter_patch: Some(D2.into()),
            claim_generation: 1,
        })
        .await
        .expect("verdict");

    // The tree drifts: D2's context no longer matches.
    fs::write(rig.worktree.path().join("app.txt"), "totally different\n").expect("drift");

    let before = broker.get_proposal(&created.review_id).await.expect("get");
    let err = broker
        .accept_counter_patch(&created.review_id)
        .await
        .expect_err("must be stale");
    assert!(matches!(err, BrokerError::StaleCounterPatch(_)));
    assert_eq!(err.code(), "stale_counter_patch");

    let after = broker.get_proposal(&created.review_id).await.expect("get");
    assert_eq!(
        serde_json::to_value(&before).unwrap(),
        serde_json::to_value(&after).unwrap(),
        "row must be unchanged after a stale accept"
    );
}

#[tokio::test]
async fn turn_alternation_is_enforced() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");

    let msg = |role: SenderRole, body: &str| MessageInput {
        review_id: created.review_id.clone(),
        sender_role: role,
        body: body.into(),
        metadata: None,
    };

    broker.add_message(msg(SenderRole::Reviewer, "q1")).await.expect("q1");
    let err = broker
        .add_message(msg(SenderRole::Reviewer, "q2"))
        .await
        .expect_err("same role twice");
    assert_eq!(err.code(), "turn_violation");
    broker.add_message(msg(SenderRole::Proposer, "a1")).await.expect("a1");

    let discussion = broker
        .get_discussion(&created.review_id, None)
        .await
        .expect("discussion");
    assert_eq!(discussion.count, 2);
    assert_eq!(discussion.messages[0].body, "q1");
    assert_eq!(discussion.messages[1].body, "a1");
}

#[tokio::test]
async fn revision_resets_and_next_claim_bumps_generation() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");
    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::ChangesRequested,
            notes: Some("rework".into()),
            counter_patch: Some(D2.into()),
            claim_generation: 1,
        })
        .await
        .expect("verdict");

    let mut v2 = proposal(Some(D1));
    v2.intent = "Refactor logger v2".into();
    v2.review_id = Some(created.review_id.clone());
    let revised = broker.create_review(v2).await.expect("revision");
    assert_eq!(revised.current_round, 2);
    assert_eq!(revised.status, ReviewStatus::Pending);

    let status = broker
        .get_review_status(&created.review_id, false, None)
        .await
        .expect("status");
    assert_eq!(status.summary.claimed_by, None);
    assert_eq!(status.summary.counter_patch_status, None);
    assert_eq!(status.summary.intent, "Refactor logger v2");

    let claim = broker
        .claim_review(&created.review_id, "rev-b")
        .await
        .expect("second claim");
    assert_eq!(claim.claim_generation, 2);
}

#[tokio::test]
async fn concurrent_claims_have_exactly_one_winner() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");

    let (a, b) = tokio::join!(
        rig.broker.claim_review(&created.review_id, "rev-a"),
        rig.broker.claim_review(&created.review_id, "rev-b"),
    );
    let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one claim may win");
    let loser = if a.is_ok() { b } else { a };
    let code = loser.expect_err("loser").code();
    assert!(
        code == "invalid_transition" || code == "diff_conflict",
        "unexpected loser outcome: {code}"
    );

    let status = broker
        .get_review_status(&created.review_id, false, None)
        .await
        .expect("status");
    assert_eq!(status.summary.claim_generation, 1, "one increment only");
}

#[tokio::test]
async fn stale_diff_auto_rejects_at_claim_time() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    fs::write(rig.worktree.path().join("app.txt"), "drifted\n").expect("drift");

    let err = broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect_err("diff is stale");
    assert_eq!(err.code(), "diff_conflict");

    let status = broker
        .get_review_status(&created.review_id, false, None)
        .await
        .expect("status");
    assert_eq!(status.summary.status, ReviewStatus::ChangesRequested);
    assert!(status.verdict_reason.is_some(), "stderr recorded as reason");

    let timeline = broker
        .get_review_timeline(&created.review_id)
        .await
        .expect("timeline");
    assert!(timeline
        .events
        .iter()
        .any(|e| e.event_type == EventType::AutoRejected));
}

#[tokio::test]
async fn skip_validation_reviews_never_revalidate() {
    let rig = rig();
    let broker = &rig.broker;

    let mut input = proposal(Some(D1));
    input.skip_diff_validation = true;
    let created = broker.create_review(input).await.expect("create");

    // Tree drift would fail a dry run, but the row opted out.
    fs::write(rig.worktree.path().join("app.txt"), "drifted\n").expect("drift");
    let claim = broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim must skip revalidation");
    assert_eq!(claim.status, ReviewStatus::Claimed);
}

#[tokio::test]
async fn stale_claim_generation_is_rejected() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");

    let err = broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::Approved,
            notes: None,
            counter_patch: None,
            claim_generation: 0,
        })
        .await
        .expect_err("generation is stale");
    assert_eq!(err.code(), "stale_claim_generation");
}

#[tokio::test]
async fn comment_verdict_leaves_status_untouched() {
    let rig = rig();
    let broker = &rig.broker;

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");

    let out = broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::Comment,
            notes: Some("looking, one question".into()),
            counter_patch: None,
            claim_generation: 1,
        })
        .await
        .expect("comment");
    assert_eq!(out.status, ReviewStatus::Claimed);
}

#[tokio::test]
async fn audit_transitions_follow_the_state_table() {
    let rig = rig();
    let broker = &rig.broker;

    // A busy life: claim, changes, revision, second claim, approval, close.
    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    broker.claim_review(&created.review_id, "rev-a").await.expect("claim");
    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::ChangesRequested,
            notes: Some("rework".into()),
            counter_patch: None,
            claim_generation: 1,
        })
        .await
        .expect("verdict");
    let mut v2 = proposal(Some(D1));
    v2.review_id = Some(created.review_id.clone());
    broker.create_review(v2).await.expect("revision");
    broker.claim_review(&created.review_id, "rev-b").await.expect("reclaim");
    broker
        .submit_verdict(VerdictInput {
            review_id: created.review_id.clone(),
            verdict: Verdict::Approved,
            notes: None,
            counter_patch: None,
            claim_generation: 2,
        })
        .await
        .expect("approve");
    broker.close_review(&created.review_id, None).await.expect("close");

    let timeline = broker
        .get_review_timeline(&created.review_id)
        .await
        .expect("timeline");
    let states: Vec<ReviewStatus> = timeline
        .events
        .iter()
        .filter_map(|e| e.metadata.get("status"))
        .filter_map(|s| s.as_str())
        .filter_map(ReviewStatus::parse)
        .collect();
    assert!(states.len() >= 6);
    for pair in states.windows(2) {
        review_store::validate_transition(pair[0], pair[1])
            .unwrap_or_else(|e| panic!("audit trail broke the table: {e}"));
    }
}

#[tokio::test]
async fn long_poll_wakes_on_matching_review() {
    let rig = rig();
    let broker = rig.broker.clone();

    let waiter = {
        let broker = broker.clone();
        tokio::spawn(async move {
            broker
                .list_reviews(
                    review_engine::queries::Filter {
                        status: Some(ReviewStatus::Pending),
                        ..Default::default()
                    },
                    true,
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    broker.create_review(proposal(None)).await.expect("create");

    let listed = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("wake within budget")
        .expect("join")
        .expect("list");
    assert_eq!(listed.count, 1);
}

#[tokio::test]
async fn status_long_poll_observes_the_commit_that_woke_it() {
    let rig = rig();
    let broker = rig.broker.clone();

    let created = broker.create_review(proposal(Some(D1))).await.expect("create");
    // The creation emit left the latch set; this wait consumes it
    // immediately, like the first iteration of a client poll loop.
    let before = broker
        .get_review_status(&created.review_id, true, None)
        .await
        .expect("before");
    assert_eq!(before.summary.status, ReviewStatus::Pending);

    let waiter = {
        let broker = broker.clone();
        let id = created.review_id.clone();
        tokio::spawn(async move { broker.get_review_status(&id, true, Some("test")).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    broker
        .claim_review(&created.review_id, "rev-a")
        .await
        .expect("claim");

    let after = tokio::time::timeout(Duration::from_secs(5), waiter)
        .await
        .expect("wake within budget")
        .expect("join")
        .expect("status");
    assert_eq!(after.summary.status, ReviewStatus::Claimed);
    assert!(after.summary.updated_at >= before.summary.updated_at);
}
