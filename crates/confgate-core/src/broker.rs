//! Approval broker: orchestrates request, decision and delivery.
//!
//! The [`ApprovalBroker`] coordinates between:
//! - The [`ConfigPool`] (which files exist and in what state)
//! - The [`RequestRegistry`] (who is waiting on which file)
//! - The [`NotificationChannel`] (requesters and the approver)
//!
//! # Locking
//!
//! Pool and registry share one async mutex. Each state transition
//! (reserve + register, take + release, consume) happens under it; every
//! network send happens after the lock is dropped. A failed send is answered
//! with a compensating transition (release) rather than a rollback.
//!
//! Pool calls that touch the disk run through [`blocking`], which lets a
//! multi-thread runtime move other tasks off the current worker meanwhile.
//!
//! # Request Flow
//!
//! 1. Reserve a file; an empty pool yields `NoStockAvailable` and one alert
//!    to the approver
//! 2. Register the reservation; a duplicate requester gets its file released
//!    and `AlreadyPending`
//! 3. Prompt the approver; if that fails, withdraw the reservation
//!
//! # Decision Flow
//!
//! 1. Take the registry entry; nothing there means `NotFound`
//! 2. Reject: release and notify
//! 3. Approve: load, deliver, then consume; a failed delivery releases

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::channel::NotificationChannel;
use crate::decision::{Decision, DecisionToken, Outcome};
use crate::error::{BrokerError, BrokerResult, PoolError};
use crate::messages;
use crate::pool::{ConfigPool, StockLevels};
use crate::registry::{PendingRequest, RequestRegistry};
use crate::types::{ConfigFile, ConfigState, RecipientId, Requester};

/// Result of [`ApprovalBroker::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A file was reserved and the approver prompted.
    Prompted {
        /// The reserved file.
        file: ConfigFile,
    },
    /// The pool is empty. The approver was alerted.
    NoStockAvailable,
    /// The requester already has an open request.
    AlreadyPending,
}

/// Result of [`ApprovalBroker::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// The file was delivered and consumed.
    Approved {
        /// Recipient of the file.
        requester: RecipientId,
        /// The consumed file.
        file: ConfigFile,
    },
    /// The file went back to the pool.
    Rejected {
        /// The rejected requester.
        requester: RecipientId,
        /// The released file.
        file: ConfigFile,
    },
    /// No pending request: stale or duplicate decision.
    NotFound {
        /// The requester named by the decision.
        requester: RecipientId,
    },
    /// The requester could not be reached; the file went back to the pool.
    DeliveryFailed {
        /// The unreachable requester.
        requester: RecipientId,
        /// The released file.
        file: ConfigFile,
        /// Transport-provided reason.
        reason: String,
    },
    /// The store lost the file or could not move it. The reservation was
    /// abandoned.
    StoreInconsistency {
        /// The affected requester.
        requester: RecipientId,
        /// The affected file.
        file: ConfigFile,
        /// Store-provided reason.
        reason: String,
    },
}

impl DecisionOutcome {
    /// Check if the file reached the requester.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved { .. })
    }

    /// One-line approver-facing summary.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Approved { requester, file } => messages::delivered_notice(file, *requester),
            Self::Rejected { requester, .. } => messages::rejected_notice(*requester),
            Self::NotFound { requester } => messages::already_handled_notice(*requester),
            Self::DeliveryFailed {
                requester,
                file,
                reason,
            } => messages::delivery_failed_notice(file, *requester, reason),
            Self::StoreInconsistency {
                requester,
                file,
                reason,
            } => messages::store_inconsistency_notice(file, *requester, reason),
        }
    }
}

/// State guarded by the broker's lock.
struct Ledger {
    pool: Box<dyn ConfigPool>,
    registry: RequestRegistry,
}

/// The approval broker. Owns the request/approval/allocation workflow.
pub struct ApprovalBroker {
    ledger: Mutex<Ledger>,
    channel: Arc<dyn NotificationChannel>,
    approver: RecipientId,
    pending_ttl: Option<Duration>,
}

impl ApprovalBroker {
    /// Create a broker over `pool` that prompts `approver` through `channel`.
    #[must_use]
    pub fn new(
        pool: impl ConfigPool + 'static,
        channel: Arc<dyn NotificationChannel>,
        approver: RecipientId,
    ) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                pool: Box::new(pool),
                registry: RequestRegistry::new(),
            }),
            channel,
            approver,
            pending_ttl: None,
        }
    }

    /// Expire pending requests older than `ttl` on [`reap_expired`](Self::reap_expired).
    #[must_use]
    pub fn with_pending_ttl(mut self, ttl: Duration) -> Self {
        self.pending_ttl = Some(ttl);
        self
    }

    /// The trusted approver identity.
    #[must_use]
    pub fn approver(&self) -> RecipientId {
        self.approver
    }

    /// Check if `id` is the approver.
    #[must_use]
    pub fn is_approver(&self, id: RecipientId) -> bool {
        id == self.approver
    }

    /// Configured pending-request expiry, if any.
    #[must_use]
    pub fn pending_ttl(&self) -> Option<Duration> {
        self.pending_ttl
    }

    /// Ask for a config file on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Store`] if the pool cannot be read, or
    /// [`BrokerError::PromptUndeliverable`] if the approver could not be
    /// prompted. In both cases no reservation is left behind.
    pub async fn request(&self, requester: Requester) -> BrokerResult<RequestOutcome> {
        let requester_id = requester.id;

        let (pending, pending_count) = {
            let mut ledger = self.ledger.lock().await;
            let Some(file) = blocking(|| ledger.pool.reserve())? else {
                drop(ledger);
                info!(requester = %requester_id, "config pool exhausted");
                self.notify_best_effort(self.approver, messages::OUT_OF_STOCK_ALERT)
                    .await;
                return Ok(RequestOutcome::NoStockAvailable);
            };

            let pending = PendingRequest::new(requester, file);
            if let Err(e) = ledger.registry.put(pending.clone()) {
                if let Err(release_err) = ledger.pool.release(&pending.file) {
                    warn!(file = %pending.file, error = %release_err, "failed to release duplicate reservation");
                }
                debug!(requester = %requester_id, "{e}");
                return Ok(RequestOutcome::AlreadyPending);
            }
            let count = ledger.registry.count();
            (pending, count)
        };

        let text = messages::approval_prompt(&pending, pending_count);
        let (approve, reject) = DecisionToken::pair(requester_id);
        if let Err(e) = self
            .channel
            .send_decision_prompt(self.approver, &text, &approve, &reject)
            .await
        {
            warn!(
                requester = %requester_id,
                file = %pending.file,
                error = %e,
                "failed to prompt approver, withdrawing reservation"
            );
            self.withdraw(&pending).await;
            return Err(BrokerError::PromptUndeliverable {
                reason: e.to_string(),
            });
        }

        info!(requester = %requester_id, file = %pending.file, "request sent to approver");
        Ok(RequestOutcome::Prompted { file: pending.file })
    }

    /// Apply the approver's decision.
    ///
    /// The registry take is the commit point: a second decision for the same
    /// request reports [`DecisionOutcome::NotFound`] without side effects.
    pub async fn decide(&self, decision: Decision) -> DecisionOutcome {
        let requester = decision.requester_id;
        let taken = self.ledger.lock().await.registry.take_and_clear(requester);
        let Some(pending) = taken else {
            info!(requester = %requester, outcome = %decision.outcome, "decision for unknown or already handled request");
            return DecisionOutcome::NotFound { requester };
        };

        match decision.outcome {
            Outcome::Reject => self.reject(pending).await,
            Outcome::Approve => self.deliver(pending).await,
        }
    }

    /// Release every pending request older than the configured TTL.
    ///
    /// Returns how many were released. A no-op without a TTL.
    pub async fn reap_expired(&self) -> usize {
        let Some(ttl) = self.pending_ttl else {
            return 0;
        };

        let expired = {
            let mut ledger = self.ledger.lock().await;
            let expired = ledger.registry.drain_expired(ttl, Utc::now());
            for pending in &expired {
                if let Err(e) = ledger.pool.release(&pending.file) {
                    warn!(file = %pending.file, error = %e, "failed to release expired reservation");
                }
            }
            expired
        };
        if expired.is_empty() {
            return 0;
        }

        for pending in &expired {
            info!(
                requester = %pending.requester.id,
                file = %pending.file,
                outcome = "expired",
                "pending request expired"
            );
            self.notify_best_effort(pending.requester.id, messages::EXPIRED_NOTICE)
                .await;
        }
        self.notify_best_effort(self.approver, &messages::expired_summary(expired.len()))
            .await;
        expired.len()
    }

    /// Number of requests awaiting a decision.
    pub async fn pending_count(&self) -> usize {
        self.ledger.lock().await.registry.count()
    }

    /// Check if `requester` has an open request.
    pub async fn is_pending(&self, requester: RecipientId) -> bool {
        self.ledger.lock().await.registry.contains(requester)
    }

    /// Count of files per state.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Store`] if the pool cannot be read.
    pub async fn stock(&self) -> BrokerResult<StockLevels> {
        let ledger = self.ledger.lock().await;
        Ok(blocking(|| ledger.pool.stock())?)
    }

    /// State of a file by name.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Store`] if the pool cannot be read.
    pub async fn file_state(&self, name: &str) -> BrokerResult<Option<ConfigState>> {
        let ledger = self.ledger.lock().await;
        Ok(blocking(|| ledger.pool.state(name))?)
    }

    /// Approver-facing stock and queue summary.
    ///
    /// # Errors
    ///
    /// Returns [`BrokerError::Store`] if the pool cannot be read.
    pub async fn status_report(&self) -> BrokerResult<String> {
        let ledger = self.ledger.lock().await;
        let stock = blocking(|| ledger.pool.stock())?;
        Ok(messages::status_report(&stock, ledger.registry.count()))
    }

    async fn reject(&self, pending: PendingRequest) -> DecisionOutcome {
        let requester = pending.requester.id;
        self.release(&pending.file).await;
        info!(requester = %requester, file = %pending.file, outcome = "rejected", "request rejected");

        self.notify_best_effort(requester, messages::REJECTED_NOTICE)
            .await;
        self.notify_best_effort(self.approver, &messages::rejected_notice(requester))
            .await;
        DecisionOutcome::Rejected {
            requester,
            file: pending.file,
        }
    }

    async fn deliver(&self, pending: PendingRequest) -> DecisionOutcome {
        let requester = pending.requester.id;
        let file = pending.file;

        let loaded = {
            let mut ledger = self.ledger.lock().await;
            blocking(|| ledger.pool.load(&file))
        };
        let document = match loaded {
            Ok(document) => document,
            Err(e) => {
                // A missing file already dropped its reservation; an
                // unreadable one goes back to the pool.
                if matches!(e, PoolError::Io { .. }) {
                    self.release(&file).await;
                }
                error!(requester = %requester, file = %file, error = %e, "failed to load config for delivery");
                self.notify_best_effort(requester, messages::ERROR_NOTICE)
                    .await;
                return self.store_inconsistency(requester, file, &e).await;
            },
        };

        let caption = messages::delivery_caption(&file);
        if let Err(e) = self
            .channel
            .send_document(requester, document, &caption)
            .await
        {
            let reason = e.to_string();
            warn!(requester = %requester, file = %file, error = %reason, "delivery failed, returning config to pool");
            self.release(&file).await;
            self.notify_best_effort(requester, messages::ERROR_NOTICE)
                .await;
            self.notify_best_effort(
                self.approver,
                &messages::delivery_failed_notice(&file, requester, &reason),
            )
            .await;
            return DecisionOutcome::DeliveryFailed {
                requester,
                file,
                reason,
            };
        }

        let consumed = {
            let mut ledger = self.ledger.lock().await;
            blocking(|| ledger.pool.consume(&file))
        };
        if let Err(e) = consumed {
            error!(requester = %requester, file = %file, error = %e, "config delivered but could not be consumed");
            return self.store_inconsistency(requester, file, &e).await;
        }

        info!(requester = %requester, file = %file, outcome = "approved", "config issued");
        self.notify_best_effort(self.approver, &messages::delivered_notice(&file, requester))
            .await;
        DecisionOutcome::Approved { requester, file }
    }

    async fn store_inconsistency(
        &self,
        requester: RecipientId,
        file: ConfigFile,
        err: &PoolError,
    ) -> DecisionOutcome {
        let reason = err.to_string();
        self.notify_best_effort(
            self.approver,
            &messages::store_inconsistency_notice(&file, requester, &reason),
        )
        .await;
        DecisionOutcome::StoreInconsistency {
            requester,
            file,
            reason,
        }
    }

    /// Undo a reservation whose prompt never reached the approver.
    async fn withdraw(&self, pending: &PendingRequest) {
        let mut ledger = self.ledger.lock().await;
        match ledger.registry.take_and_clear(pending.requester.id) {
            Some(current) if current.file == pending.file => {
                if let Err(e) = ledger.pool.release(&current.file) {
                    warn!(file = %current.file, error = %e, "failed to release withdrawn reservation");
                }
            },
            Some(other) => {
                // Superseded by a newer request; leave that one alone.
                if let Err(e) = ledger.registry.put(other) {
                    warn!(error = %e, "failed to restore superseding request");
                }
            },
            // Resolved concurrently by a decision.
            None => {},
        }
    }

    async fn release(&self, file: &ConfigFile) {
        if let Err(e) = self.ledger.lock().await.pool.release(file) {
            warn!(file = %file, error = %e, "failed to release reservation");
        }
    }

    async fn notify_best_effort(&self, recipient: RecipientId, text: &str) {
        if let Err(e) = self.channel.send_text(recipient, text).await {
            warn!(recipient = %recipient, error = %e, "best-effort notification failed");
        }
    }
}

/// Run synchronous pool IO without stalling the other tasks on this worker.
///
/// On a multi-thread runtime this goes through `block_in_place`; a
/// current-thread runtime (or no runtime) just calls `f`.
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        },
        _ => f(),
    }
}

impl std::fmt::Debug for ApprovalBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalBroker")
            .field("approver", &self.approver)
            .field("pending_ttl", &self.pending_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::MemoryConfigPool;
    use crate::testing::{RecordingChannel, Sent};

    const APPROVER: RecipientId = RecipientId(1000);

    fn make_broker(files: &[&str]) -> (ApprovalBroker, Arc<RecordingChannel>) {
        let channel = Arc::new(RecordingChannel::new());
        let pool = MemoryConfigPool::with_files(files.iter().copied());
        let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);
        (broker, channel)
    }

    fn user(id: i64) -> Requester {
        Requester::new(RecipientId(id), format!("User {id}"), None)
    }

    fn approve(id: i64) -> Decision {
        Decision::new(RecipientId(id), Outcome::Approve)
    }

    fn reject(id: i64) -> Decision {
        Decision::new(RecipientId(id), Outcome::Reject)
    }

    // -----------------------------------------------------------------------
    // Request
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_request_reserves_and_prompts() {
        let (broker, channel) = make_broker(&["A.conf", "B.conf"]);

        let outcome = broker.request(user(1)).await.unwrap();
        assert_eq!(
            outcome,
            RequestOutcome::Prompted {
                file: ConfigFile::new("A.conf")
            }
        );
        assert!(broker.is_pending(RecipientId(1)).await);
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Reserved)
        );

        let prompts = channel.prompts();
        assert_eq!(prompts.len(), 1);
        let Sent::Prompt {
            to,
            approve,
            reject,
            text,
        } = &prompts[0]
        else {
            panic!("expected prompt");
        };
        assert_eq!(*to, APPROVER);
        assert_eq!(approve.as_str(), "cfg:approve:1");
        assert_eq!(reject.as_str(), "cfg:reject:1");
        assert!(text.contains("A.conf"));
    }

    #[tokio::test]
    async fn test_request_empty_pool_alerts_once() {
        let (broker, channel) = make_broker(&[]);

        let outcome = broker.request(user(1)).await.unwrap();
        assert_eq!(outcome, RequestOutcome::NoStockAvailable);
        assert_eq!(broker.pending_count().await, 0);

        let attempts = channel.attempts();
        assert_eq!(attempts.len(), 1);
        assert_eq!(
            attempts[0],
            Sent::Text {
                to: APPROVER,
                text: messages::OUT_OF_STOCK_ALERT.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_request_empty_pool_alert_failure_is_swallowed() {
        let (broker, channel) = make_broker(&[]);
        channel.fail_for(APPROVER);

        let outcome = broker.request(user(1)).await.unwrap();
        assert_eq!(outcome, RequestOutcome::NoStockAvailable);
        assert_eq!(channel.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_request_leaves_pool_unchanged() {
        let (broker, channel) = make_broker(&["A.conf", "B.conf"]);
        broker.request(user(3)).await.unwrap();
        let before = broker.stock().await.unwrap();

        let outcome = broker.request(user(3)).await.unwrap();
        assert_eq!(outcome, RequestOutcome::AlreadyPending);
        assert_eq!(broker.stock().await.unwrap(), before);
        assert_eq!(
            broker.file_state("B.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
        assert_eq!(channel.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_approver_withdraws_reservation() {
        let (broker, channel) = make_broker(&["A.conf"]);
        channel.fail_for(APPROVER);

        let err = broker.request(user(1)).await.unwrap_err();
        assert!(matches!(err, BrokerError::PromptUndeliverable { .. }));
        assert!(!broker.is_pending(RecipientId(1)).await);
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );

        // The requester can try again once the approver is reachable.
        channel.restore(APPROVER);
        assert!(matches!(
            broker.request(user(1)).await.unwrap(),
            RequestOutcome::Prompted { .. }
        ));
    }

    // -----------------------------------------------------------------------
    // Decide
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_approve_delivers_and_consumes() {
        let (broker, channel) = make_broker(&["A.conf", "B.conf"]);
        broker.request(user(1)).await.unwrap();

        let outcome = broker.decide(approve(1)).await;
        assert_eq!(
            outcome,
            DecisionOutcome::Approved {
                requester: RecipientId(1),
                file: ConfigFile::new("A.conf"),
            }
        );
        assert_eq!(channel.documents_to(RecipientId(1)), vec!["A.conf"]);
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Consumed)
        );
        assert_eq!(broker.pending_count().await, 0);
        assert!(
            channel
                .texts_to(APPROVER)
                .iter()
                .any(|t| t.contains("A.conf") && t.contains("user ID: 1"))
        );
    }

    #[tokio::test]
    async fn test_reject_releases_and_notifies() {
        let (broker, channel) = make_broker(&["A.conf"]);
        broker.request(user(1)).await.unwrap();

        let outcome = broker.decide(reject(1)).await;
        assert!(matches!(outcome, DecisionOutcome::Rejected { .. }));
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
        assert_eq!(
            channel.texts_to(RecipientId(1)),
            vec![messages::REJECTED_NOTICE.to_string()]
        );
        assert!(
            channel
                .texts_to(APPROVER)
                .contains(&messages::rejected_notice(RecipientId(1)))
        );
    }

    #[tokio::test]
    async fn test_reject_with_unreachable_requester_still_rejects() {
        let (broker, channel) = make_broker(&["A.conf"]);
        broker.request(user(1)).await.unwrap();
        channel.fail_for(RecipientId(1));

        let outcome = broker.decide(reject(1)).await;
        assert!(matches!(outcome, DecisionOutcome::Rejected { .. }));
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
    }

    #[tokio::test]
    async fn test_second_decision_is_not_found() {
        let (broker, channel) = make_broker(&["A.conf"]);
        broker.request(user(1)).await.unwrap();

        assert!(broker.decide(approve(1)).await.is_approved());
        let sent_before = channel.attempts().len();

        let second = broker.decide(approve(1)).await;
        assert_eq!(
            second,
            DecisionOutcome::NotFound {
                requester: RecipientId(1)
            }
        );
        assert_eq!(channel.attempts().len(), sent_before);
        assert_eq!(broker.decide(reject(1)).await, second);
    }

    #[tokio::test]
    async fn test_decision_for_unknown_requester() {
        let (broker, _channel) = make_broker(&["A.conf"]);
        let outcome = broker.decide(approve(99)).await;
        assert!(matches!(outcome, DecisionOutcome::NotFound { .. }));
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
    }

    #[tokio::test]
    async fn test_unreachable_requester_returns_file() {
        let (broker, channel) = make_broker(&["A.conf", "B.conf"]);
        broker.request(user(1)).await.unwrap();
        channel.fail_for(RecipientId(1));

        let outcome = broker.decide(approve(1)).await;
        let DecisionOutcome::DeliveryFailed {
            requester, file, ..
        } = outcome.clone()
        else {
            panic!("expected delivery failure, got {outcome:?}");
        };
        assert_eq!(requester, RecipientId(1));
        assert_eq!(file, ConfigFile::new("A.conf"));
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
        assert!(!broker.is_pending(RecipientId(1)).await);
        assert!(
            channel
                .texts_to(APPROVER)
                .iter()
                .any(|t| t.contains("Could not deliver") && t.contains("user ID: 1"))
        );

        // The released file is the next one handed out.
        assert_eq!(
            broker.request(user(2)).await.unwrap(),
            RequestOutcome::Prompted {
                file: ConfigFile::new("A.conf")
            }
        );
    }

    #[tokio::test]
    async fn test_vanished_file_is_store_inconsistency() {
        let dir = tempfile::TempDir::new().unwrap();
        let pool = crate::pool::FsConfigPool::open(dir.path()).unwrap();
        let path = pool.available_dir().join("A.conf");
        std::fs::write(&path, "[Interface]").unwrap();
        let channel = Arc::new(RecordingChannel::new());
        let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER);
        broker.request(user(1)).await.unwrap();

        std::fs::remove_file(&path).unwrap();

        let outcome = broker.decide(approve(1)).await;
        assert!(matches!(
            outcome,
            DecisionOutcome::StoreInconsistency { ref file, .. } if file.name == "A.conf"
        ));
        assert!(channel.documents_to(RecipientId(1)).is_empty());
        assert_eq!(
            channel.texts_to(RecipientId(1)),
            vec![messages::ERROR_NOTICE.to_string()]
        );
        assert!(
            channel
                .texts_to(APPROVER)
                .iter()
                .any(|t| t.contains("Store error"))
        );
        assert_eq!(broker.file_state("A.conf").await.unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_reap_without_ttl_is_noop() {
        let (broker, _channel) = make_broker(&["A.conf"]);
        broker.request(user(1)).await.unwrap();
        assert_eq!(broker.reap_expired().await, 0);
        assert!(broker.is_pending(RecipientId(1)).await);
    }

    #[tokio::test]
    async fn test_reap_releases_stale_reservations() {
        let channel = Arc::new(RecordingChannel::new());
        let pool = MemoryConfigPool::with_files(["A.conf"]);
        let broker = ApprovalBroker::new(pool, channel.clone(), APPROVER)
            .with_pending_ttl(Duration::from_millis(1));
        broker.request(user(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(broker.reap_expired().await, 1);
        assert!(!broker.is_pending(RecipientId(1)).await);
        assert_eq!(
            broker.file_state("A.conf").await.unwrap(),
            Some(ConfigState::Available)
        );
        assert_eq!(
            channel.texts_to(RecipientId(1)),
            vec![messages::EXPIRED_NOTICE.to_string()]
        );

        // The approver's buttons are now stale.
        assert!(matches!(
            broker.decide(approve(1)).await,
            DecisionOutcome::NotFound { .. }
        ));
    }

    // -----------------------------------------------------------------------
    // Observability
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_status_report() {
        let (broker, _channel) = make_broker(&["A.conf", "B.conf"]);
        broker.request(user(1)).await.unwrap();
        let report = broker.status_report().await.unwrap();
        assert!(report.contains("Available: 1"));
        assert!(report.contains("Reserved: 1"));
        assert!(report.contains("Pending requests: 1"));
    }

    #[tokio::test]
    async fn test_summary_text() {
        let outcome = DecisionOutcome::NotFound {
            requester: RecipientId(5),
        };
        assert!(outcome.summary().contains("already handled"));
    }

    #[tokio::test]
    async fn test_debug() {
        let (broker, _channel) = make_broker(&[]);
        let debug = format!("{broker:?}");
        assert!(debug.contains("ApprovalBroker"));
    }
}
