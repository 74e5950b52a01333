//! End-to-end broker scenarios over both pool implementations.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use confgate_core::testing::RecordingChannel;
use confgate_core::{
    ApprovalBroker, ChannelResult, ConfigDocument, ConfigFile, ConfigState, Decision,
    DecisionOutcome, DecisionToken, FsConfigPool, MemoryConfigPool, NotificationChannel, Outcome,
    RecipientId, RequestOutcome, Requester, StockLevels,
};
use tempfile::TempDir;

const APPROVER: RecipientId = RecipientId(1);

fn requester(id: i64) -> Requester {
    Requester::new(RecipientId(id), format!("Requester {id}"), Some("someone"))
}

fn fs_broker(files: &[&str]) -> (TempDir, ApprovalBroker, Arc<RecordingChannel>) {
    let dir = TempDir::new().unwrap();
    let pool = FsConfigPool::open(dir.path()).unwrap();
    for name in files {
        std::fs::write(pool.available_dir().join(name), format!("[Interface] # {name}")).unwrap();
    }
    let channel = Arc::new(RecordingChannel::new());
    let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);
    (dir, broker, channel)
}

#[tokio::test]
async fn approve_moves_file_to_used_directory() {
    let (dir, broker, channel) = fs_broker(&["A.conf", "B.conf"]);

    let outcome = broker.request(requester(11)).await.unwrap();
    assert_eq!(
        outcome,
        RequestOutcome::Prompted {
            file: ConfigFile::new("A.conf")
        }
    );
    assert!(broker.is_pending(RecipientId(11)).await);

    let decided = broker
        .decide(Decision::new(RecipientId(11), Outcome::Approve))
        .await;
    assert!(decided.is_approved());

    assert!(dir.path().join("used").join("A.conf").exists());
    assert!(!dir.path().join("available").join("A.conf").exists());
    assert_eq!(broker.pending_count().await, 0);
    assert_eq!(channel.documents_to(RecipientId(11)), vec!["A.conf"]);
}

#[tokio::test]
async fn concurrent_pending_requests_get_distinct_files() {
    let (_dir, broker, _channel) = fs_broker(&["A.conf", "B.conf"]);

    let first = broker.request(requester(11)).await.unwrap();
    let second = broker.request(requester(12)).await.unwrap();

    let (RequestOutcome::Prompted { file: a }, RequestOutcome::Prompted { file: b }) =
        (first, second)
    else {
        panic!("both requests should be prompted");
    };
    assert_ne!(a, b);
    assert_eq!(broker.pending_count().await, 2);
}

#[tokio::test]
async fn repeated_request_is_already_pending() {
    let (_dir, broker, channel) = fs_broker(&["A.conf", "B.conf"]);

    broker.request(requester(13)).await.unwrap();
    let stock_before = broker.stock().await.unwrap();

    let again = broker.request(requester(13)).await.unwrap();
    assert_eq!(again, RequestOutcome::AlreadyPending);
    assert_eq!(broker.stock().await.unwrap(), stock_before);
    assert_eq!(channel.prompts().len(), 1);
}

#[tokio::test]
async fn unreachable_requester_gets_file_returned() {
    let (dir, broker, channel) = fs_broker(&["A.conf", "B.conf"]);
    broker.request(requester(11)).await.unwrap();
    channel.fail_for(RecipientId(11));

    let outcome = broker
        .decide(Decision::new(RecipientId(11), Outcome::Approve))
        .await;
    assert!(matches!(
        outcome,
        DecisionOutcome::DeliveryFailed { requester: RecipientId(11), ref file, .. }
            if file.name == "A.conf"
    ));
    assert!(dir.path().join("available").join("A.conf").exists());
    assert_eq!(
        broker.file_state("A.conf").await.unwrap(),
        Some(ConfigState::Available)
    );
    assert!(!broker.is_pending(RecipientId(11)).await);
    assert!(
        channel
            .texts_to(APPROVER)
            .iter()
            .any(|t| t.contains("user ID: 11"))
    );
}

#[tokio::test]
async fn empty_pool_changes_nothing() {
    let (_dir, broker, channel) = fs_broker(&[]);

    let outcome = broker.request(requester(20)).await.unwrap();
    assert_eq!(outcome, RequestOutcome::NoStockAvailable);
    assert_eq!(broker.pending_count().await, 0);
    assert_eq!(broker.stock().await.unwrap().total(), 0);
    assert_eq!(channel.attempts().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_never_share_a_file() {
    let files: Vec<String> = (0..10).map(|i| format!("wg-{i:02}.conf")).collect();
    let pool = MemoryConfigPool::with_files(files.iter().cloned());
    let channel = Arc::new(RecordingChannel::new());
    let broker = Arc::new(ApprovalBroker::new(pool, channel, APPROVER));

    let handles: Vec<_> = (100..130)
        .map(|id| {
            let broker = Arc::clone(&broker);
            tokio::spawn(async move { broker.request(requester(id)).await })
        })
        .collect();

    let mut assigned = HashSet::new();
    let mut exhausted = 0;
    for handle in futures::future::join_all(handles).await {
        match handle.unwrap().unwrap() {
            RequestOutcome::Prompted { file } => {
                assert!(assigned.insert(file), "file handed out twice");
            },
            RequestOutcome::NoStockAvailable => exhausted += 1,
            RequestOutcome::AlreadyPending => panic!("requesters are distinct"),
        }
    }
    assert_eq!(assigned.len(), 10);
    assert_eq!(exhausted, 20);
    assert_eq!(broker.pending_count().await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_decisions_apply_once() {
    let pool = MemoryConfigPool::with_files(["A.conf"]);
    let channel = Arc::new(RecordingChannel::new());
    let broker = Arc::new(ApprovalBroker::new(pool, channel.clone(), APPROVER));
    broker.request(requester(7)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let broker = Arc::clone(&broker);
            let outcome = if i % 2 == 0 {
                Outcome::Approve
            } else {
                Outcome::Reject
            };
            tokio::spawn(async move { broker.decide(Decision::new(RecipientId(7), outcome)).await })
        })
        .collect();

    let outcomes: Vec<DecisionOutcome> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let effective = outcomes
        .iter()
        .filter(|o| !matches!(o, DecisionOutcome::NotFound { .. }))
        .count();
    assert_eq!(effective, 1);
    assert!(channel.documents_to(RecipientId(7)).len() <= 1);
}

#[tokio::test]
async fn file_count_is_conserved_across_operations() {
    let names = ["a.conf", "b.conf", "c.conf", "d.conf", "e.conf"];
    let pool = MemoryConfigPool::with_files(names);
    let channel = Arc::new(RecordingChannel::new());
    let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);
    channel.fail_for(RecipientId(3));

    // Deterministic mix of requests and decisions, including failures.
    for round in 0..40_i64 {
        let id = round % 6;
        let outcome = if round % 3 == 0 {
            Outcome::Reject
        } else {
            Outcome::Approve
        };
        if round % 2 == 0 {
            let _ = broker.request(requester(id)).await.unwrap();
        } else {
            broker.decide(Decision::new(RecipientId(id), outcome)).await;
        }
        let stock = broker.stock().await.unwrap();
        assert_eq!(stock.total(), names.len(), "round {round}: {stock:?}");
        assert_eq!(stock.reserved, broker.pending_count().await);
    }
}

#[tokio::test]
async fn file_already_in_used_is_never_issued_across_restarts() {
    let dir = TempDir::new().unwrap();
    let pool = FsConfigPool::open(dir.path()).unwrap();
    std::fs::write(pool.used_dir().join("A.conf"), "issued earlier").unwrap();
    std::fs::write(pool.available_dir().join("A.conf"), "stale copy").unwrap();

    for id in [5, 6] {
        // Fresh pool each round, as after a restart.
        let pool = FsConfigPool::open(dir.path()).unwrap();
        let channel = Arc::new(RecordingChannel::new());
        let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);

        let outcome = broker.request(requester(id)).await.unwrap();
        assert_eq!(outcome, RequestOutcome::NoStockAvailable);
        broker
            .decide(Decision::new(RecipientId(id), Outcome::Approve))
            .await;
        assert!(channel.documents_to(RecipientId(id)).is_empty());
    }
    assert_eq!(
        std::fs::read_to_string(dir.path().join("used").join("A.conf")).unwrap(),
        "issued earlier"
    );
}

/// Removes the file from `available/` while it is being sent, so the
/// consume that follows finds nothing to move.
struct VanishingChannel {
    inner: RecordingChannel,
    available_dir: PathBuf,
}

#[async_trait]
impl NotificationChannel for VanishingChannel {
    async fn send_text(&self, recipient: RecipientId, text: &str) -> ChannelResult<()> {
        self.inner.send_text(recipient, text).await
    }

    async fn send_document(
        &self,
        recipient: RecipientId,
        document: ConfigDocument,
        caption: &str,
    ) -> ChannelResult<()> {
        for entry in std::fs::read_dir(&self.available_dir).unwrap() {
            std::fs::remove_file(entry.unwrap().path()).unwrap();
        }
        self.inner.send_document(recipient, document, caption).await
    }

    async fn send_decision_prompt(
        &self,
        recipient: RecipientId,
        text: &str,
        approve: &DecisionToken,
        reject: &DecisionToken,
    ) -> ChannelResult<()> {
        self.inner
            .send_decision_prompt(recipient, text, approve, reject)
            .await
    }
}

#[tokio::test]
async fn file_missing_after_delivery_is_store_inconsistency() {
    let dir = TempDir::new().unwrap();
    let pool = FsConfigPool::open(dir.path()).unwrap();
    std::fs::write(pool.available_dir().join("A.conf"), "[Interface]").unwrap();
    let channel = Arc::new(VanishingChannel {
        inner: RecordingChannel::new(),
        available_dir: pool.available_dir().to_path_buf(),
    });
    let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);

    broker.request(requester(9)).await.unwrap();
    let outcome = broker
        .decide(Decision::new(RecipientId(9), Outcome::Approve))
        .await;

    assert!(matches!(
        outcome,
        DecisionOutcome::StoreInconsistency { requester: RecipientId(9), ref file, ref reason }
            if file.name == "A.conf" && reason.contains("missing")
    ));
    assert_eq!(channel.inner.documents_to(RecipientId(9)), vec!["A.conf"]);
    assert_eq!(broker.stock().await.unwrap(), StockLevels::default());
    assert_eq!(broker.pending_count().await, 0);
    assert!(
        channel
            .inner
            .texts_to(APPROVER)
            .iter()
            .any(|t| t.contains("Store error for A.conf"))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_requests_and_decisions_conserve_files() {
    let names: Vec<String> = (0..8).map(|i| format!("wg-{i:02}.conf")).collect();
    let (_dir, broker, channel) = fs_broker(&names.iter().map(String::as_str).collect::<Vec<_>>());
    let broker = Arc::new(broker);
    channel.fail_for(RecipientId(4));

    for round in 0..25_i64 {
        let mut handles = Vec::new();
        for id in 0..6_i64 {
            let requesting = Arc::clone(&broker);
            handles.push(tokio::spawn(async move {
                let _ = requesting.request(requester(id)).await;
            }));

            let deciding = Arc::clone(&broker);
            let outcome = if (round + id) % 3 == 0 {
                Outcome::Reject
            } else {
                Outcome::Approve
            };
            handles.push(tokio::spawn(async move {
                deciding.decide(Decision::new(RecipientId(id), outcome)).await;
            }));
        }
        for handle in futures::future::join_all(handles).await {
            handle.unwrap();
        }

        let stock = broker.stock().await.unwrap();
        assert_eq!(stock.total(), names.len(), "round {round}: {stock:?}");
        assert_eq!(stock.reserved, broker.pending_count().await, "round {round}");
    }
}
