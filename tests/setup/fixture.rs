use std::sync::Arc;

use habit_stake_client::{
    AccountReader, ActionOrchestrator, AddressDeriver, Commitment, ConfirmationPolicy, GoalHash,
    GoalParams, KeyedLocks, KeypairSigner, TransactionSigner,
};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use utils::{MemoryLedger, TestClock};

use crate::setup::test_data::*;
use crate::setup::Actions;

pub struct TestFixture {
    pub ledger: Arc<MemoryLedger>,
    pub clock: TestClock,
    pub deriver: AddressDeriver,
    pub locks: Arc<KeyedLocks>,
    /// Creates goals and resolves them.
    pub authority: Keypair,
    pub staker: Keypair,
    pub group_vault: Pubkey,
    pub mint: Pubkey,
    pub goal_hash: GoalHash,
}

impl TestFixture {
    pub fn new() -> Self {
        let deriver = AddressDeriver::default();
        let clock = TestClock::new(NOW);
        let ledger = Arc::new(MemoryLedger::new(deriver, clock.clone()));

        let authority = Keypair::new();
        let staker = Keypair::new();
        let mint = Pubkey::new_unique();
        ledger.mint_to(&staker.pubkey(), &mint, INITIAL_BALANCE);
        ledger.mint_to(&authority.pubkey(), &mint, INITIAL_BALANCE);

        Self {
            ledger,
            clock,
            deriver,
            locks: Arc::new(KeyedLocks::default()),
            authority,
            staker,
            group_vault: Pubkey::new_unique(),
            mint,
            goal_hash: GoalHash::from_goal_id(DEFAULT_GOAL_ID),
        }
    }

    pub fn policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            attempts: CONFIRM_ATTEMPTS,
            interval: CONFIRM_INTERVAL,
            commitment: Commitment::Confirmed,
        }
    }

    pub fn orchestrator(&self, signer: Arc<dyn TransactionSigner>) -> ActionOrchestrator {
        ActionOrchestrator::new(self.ledger.clone(), signer, self.deriver)
            .with_clock(Arc::new(self.clock.clone()))
            .with_policy(self.policy())
            .with_locks(self.locks.clone())
    }

    pub fn orchestrator_for(&self, keypair: &Keypair) -> ActionOrchestrator {
        self.orchestrator(Arc::new(KeypairSigner::new(keypair.insecure_clone())))
    }

    pub fn reader(&self) -> AccountReader {
        AccountReader::new(self.ledger.clone(), self.deriver)
    }

    pub fn starts_on(&self) -> i64 {
        NOW + START_OFFSET
    }

    pub fn ends_on(&self) -> i64 {
        NOW + END_OFFSET
    }

    pub fn goal_params(&self, goal_hash: GoalHash) -> GoalParams {
        GoalParams {
            goal_hash,
            starts_on: self.starts_on(),
            ends_on: self.ends_on(),
            resolver: None,
            group_vault: self.group_vault,
            mint: self.mint,
        }
    }

    pub async fn with_goal(self) -> Self {
        let result = self.init_goal().await;
        assert!(result.is_ok(), "Failed to init goal: {:?}", result);
        self
    }

    pub async fn with_open_stake(self) -> Self {
        let result = self.open_stake(STAKE_AMOUNT).await;
        assert!(result.is_ok(), "Failed to open stake: {:?}", result);
        self
    }

    pub async fn with_funded_stake(self) -> Self {
        let result = self.deposit_stake().await;
        assert!(result.is_ok(), "Failed to deposit stake: {:?}", result);
        self
    }
}
