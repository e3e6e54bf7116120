//! Drives an action through build, sign, broadcast and confirm.
//!
//! Progress is published on an [`ActionTracker`]. Actions on the same
//! (goal, staker) pair are serialized; different pairs run in parallel.
//! Nothing local changes until the ledger reports a definitive result.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tokio::sync::{watch, Mutex as AsyncMutex, OwnedMutexGuard};
use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::composer::{StakeAction, TransactionComposer};
use crate::config::ClientConfig;
use crate::errors::{ClientError, ErrorKind, LedgerError, Result, ValidationError};
use crate::ledger::{Commitment, LedgerClient, SignatureStatus};
use crate::pda::AddressDeriver;
use crate::signer::TransactionSigner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    Idle,
    Building,
    Signing,
    Broadcasting,
    Confirming {
        signature: Signature,
        attempt: u32,
    },
    Success {
        signature: Signature,
    },
    Error {
        kind: ErrorKind,
        message: String,
        signature: Option<Signature>,
    },
}

impl ActionStatus {
    fn stage(&self) -> u8 {
        match self {
            ActionStatus::Idle => 0,
            ActionStatus::Building => 1,
            ActionStatus::Signing => 2,
            ActionStatus::Broadcasting => 3,
            ActionStatus::Confirming { .. } => 4,
            ActionStatus::Success { .. } | ActionStatus::Error { .. } => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage() == 5
    }

    fn can_advance_to(&self, next: &ActionStatus) -> bool {
        match (self, next) {
            (
                ActionStatus::Confirming { attempt: prev, .. },
                ActionStatus::Confirming { attempt, .. },
            ) => attempt > prev,
            (current, ActionStatus::Error { .. }) => !current.is_terminal(),
            (current, next) => next.stage() > current.stage(),
        }
    }
}

/// Observable status of one action. Moves strictly forward; a terminal
/// status only goes back to `Idle` through [`restart`](Self::restart).
pub struct ActionTracker {
    tx: watch::Sender<ActionStatus>,
}

impl Default for ActionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ActionStatus::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.tx.subscribe()
    }

    pub fn status(&self) -> ActionStatus {
        self.tx.borrow().clone()
    }

    /// Returns false when the transition would move backwards.
    fn advance(&self, next: ActionStatus) -> bool {
        self.tx.send_if_modified(|current| {
            if current.can_advance_to(&next) {
                *current = next;
                true
            } else {
                debug!(?current, ?next, "ignored status transition");
                false
            }
        })
    }

    /// Back to `Idle` after `Success` or `Error`.
    pub fn restart(&self) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_terminal() {
                *current = ActionStatus::Idle;
                true
            } else {
                false
            }
        })
    }
}

pub struct AbortHandle(watch::Sender<bool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.send_replace(true);
    }
}

/// Lets the caller stop waiting on signing or confirmation.
#[derive(Clone)]
pub struct AbortSignal(watch::Receiver<bool>);

impl AbortSignal {
    pub fn new() -> (AbortHandle, AbortSignal) {
        let (tx, rx) = watch::channel(false);
        (AbortHandle(tx), AbortSignal(rx))
    }

    /// A signal that never fires.
    pub fn never() -> AbortSignal {
        let (_, rx) = watch::channel(false);
        AbortSignal(rx)
    }

    async fn aborted(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub attempts: u32,
    pub interval: Duration,
    pub commitment: Commitment,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(1),
            commitment: Commitment::Confirmed,
        }
    }
}

impl From<&ClientConfig> for ConfirmationPolicy {
    fn from(config: &ClientConfig) -> Self {
        Self {
            attempts: config.confirm_attempts,
            interval: config.confirm_interval(),
            commitment: config.commitment,
        }
    }
}

type LockKey = (Pubkey, Pubkey);

/// One async mutex per (goal, staker) pair.
#[derive(Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub async fn acquire(&self, goal: Pubkey, staker: Pubkey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry((goal, staker)).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ActionOrchestrator {
    composer: TransactionComposer,
    ledger: Arc<dyn LedgerClient>,
    signer: Arc<dyn TransactionSigner>,
    clock: Arc<dyn Clock>,
    policy: ConfirmationPolicy,
    locks: Arc<KeyedLocks>,
}

impl ActionOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        signer: Arc<dyn TransactionSigner>,
        deriver: AddressDeriver,
    ) -> Self {
        Self {
            composer: TransactionComposer::new(ledger.clone(), deriver),
            ledger,
            signer,
            clock: Arc::new(SystemClock),
            policy: ConfirmationPolicy::default(),
            locks: Arc::new(KeyedLocks::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares the per-(goal, staker) locks with other orchestrators.
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn composer(&self) -> &TransactionComposer {
        &self.composer
    }

    /// Runs `action` to a terminal status. `tracker` must be `Idle`.
    pub async fn execute(
        &self,
        action: StakeAction,
        tracker: &ActionTracker,
        abort: AbortSignal,
    ) -> Result<Signature> {
        if tracker.status() != ActionStatus::Idle {
            return Err(ValidationError::TrackerNotIdle.into());
        }

        let result = self.run(&action, tracker, abort).await;
        match &result {
            Ok(signature) => {
                info!(action = action.kind().name(), %signature, "action confirmed");
                tracker.advance(ActionStatus::Success {
                    signature: *signature,
                });
            }
            Err(err) => {
                error!(action = action.kind().name(), kind = ?err.kind(), %err, "action failed");
                tracker.advance(ActionStatus::Error {
                    kind: err.kind(),
                    message: err.to_string(),
                    signature: err.signature(),
                });
            }
        }
        result
    }

    async fn run(
        &self,
        action: &StakeAction,
        tracker: &ActionTracker,
        mut abort: AbortSignal,
    ) -> Result<Signature> {
        action.validate()?;
        let payer = self.signer.address()?;

        let deriver = self.composer.deriver();
        let (goal, _) = deriver.find_goal_pda(action.goal_hash());
        let staker = action.staker(&payer);
        let _guard = self.locks.acquire(goal, staker).await;

        tracker.advance(ActionStatus::Building);
        let instructions = self
            .composer
            .compose(&payer, action, self.clock.now())
            .await?;
        let transaction = self
            .composer
            .build_transaction(&instructions, &payer)
            .await?;

        tracker.advance(ActionStatus::Signing);
        debug!(action = action.kind().name(), "awaiting signature");
        let signed = tokio::select! {
            signed = self.signer.sign(transaction.clone()) => signed?,
            _ = abort.aborted() => return Err(ClientError::Aborted { signature: None }),
        };
        if signed.message != transaction.message {
            return Err(ClientError::SignerRejected(
                "signer returned a different transaction".into(),
            ));
        }

        let required = usize::from(signed.message.header.num_required_signatures);
        let signature = match signed.signatures.first() {
            Some(first) if signed.signatures.len() == required && signed.is_signed() => *first,
            _ => {
                return Err(ClientError::SignerRejected(
                    "signer returned an unsigned transaction".into(),
                ))
            }
        };

        tracker.advance(ActionStatus::Broadcasting);
        match self.ledger.send_transaction(&signed).await {
            Ok(_) => info!(%signature, "transaction submitted"),
            Err(LedgerError::Rejected { message, logs }) => {
                return Err(ClientError::OnChainRejection {
                    signature: Some(signature),
                    message,
                    logs,
                })
            }
            Err(err) => return Err(err.into()),
        }

        self.confirm(signature, tracker, &mut abort).await?;
        Ok(signature)
    }

    /// Polls until `signature` reaches the policy commitment, fails, or the
    /// attempt budget runs out. Each attempt, poll included, fits in one
    /// interval; a poll still pending at the deadline counts as a miss.
    async fn confirm(
        &self,
        signature: Signature,
        tracker: &ActionTracker,
        abort: &mut AbortSignal,
    ) -> Result<()> {
        for attempt in 1..=self.policy.attempts {
            tracker.advance(ActionStatus::Confirming { signature, attempt });
            let deadline = Instant::now() + self.policy.interval;

            let polled = tokio::select! {
                polled = timeout_at(deadline, self.ledger.get_signature_status(&signature)) => polled,
                _ = abort.aborted() => return Err(aborted(signature)),
            };
            match polled {
                Ok(Ok(Some(SignatureStatus::Failed(message)))) => {
                    return Err(ClientError::OnChainRejection {
                        signature: Some(signature),
                        message,
                        logs: Vec::new(),
                    });
                }
                Ok(Ok(Some(status))) if status.satisfies(self.policy.commitment) => return Ok(()),
                Ok(Ok(status)) => debug!(%signature, attempt, ?status, "not yet confirmed"),
                Ok(Err(err)) => warn!(%signature, attempt, %err, "status poll failed"),
                Err(_) => warn!(%signature, attempt, "status poll timed out"),
            }

            if attempt < self.policy.attempts {
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    _ = abort.aborted() => return Err(aborted(signature)),
                }
            }
        }

        Err(ClientError::ConfirmationTimeout {
            signature,
            attempts: self.policy.attempts,
        })
    }

    /// One-shot lookup for a submission that previously timed out. Searches
    /// the ledger's full history, not just recent statuses.
    pub async fn reconcile(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        Ok(self
            .ledger
            .get_signature_status_with_history(signature)
            .await?)
    }
}

fn aborted(signature: Signature) -> ClientError {
    info!(%signature, "confirmation wait aborted");
    ClientError::Aborted {
        signature: Some(signature),
    }
}
