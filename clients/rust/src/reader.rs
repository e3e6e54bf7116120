//! Fetches program accounts and keeps "does not exist yet" apart from
//! "exists but does not decode".

use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use tracing::{debug, error};

use crate::accounts::{Goal, Stake};
use crate::errors::{ClientError, DecodeError, Result};
use crate::ledger::LedgerClient;
use crate::pda::AddressDeriver;
use crate::rules::{self, ActionKind};
use crate::types::GoalHash;

/// An account type owned by the staking program.
pub trait ProgramAccount: Sized {
    const NAME: &'static str;

    fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError>;
}

impl ProgramAccount for Goal {
    const NAME: &'static str = "Goal";

    fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        Goal::from_bytes(data)
    }
}

impl ProgramAccount for Stake {
    const NAME: &'static str = "Stake";

    fn decode(data: &[u8]) -> std::result::Result<Self, DecodeError> {
        Stake::from_bytes(data)
    }
}

/// Goal and stake state for one staker, with what they may do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeView {
    pub goal_address: Pubkey,
    pub goal: Goal,
    pub stake_address: Pubkey,
    pub stake: Option<Stake>,
    pub allowed_actions: Vec<ActionKind>,
}

#[derive(Clone)]
pub struct AccountReader {
    ledger: Arc<dyn LedgerClient>,
    deriver: AddressDeriver,
}

impl AccountReader {
    pub fn new(ledger: Arc<dyn LedgerClient>, deriver: AddressDeriver) -> Self {
        Self { ledger, deriver }
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// `Ok(None)` when no account exists at `address`.
    pub async fn fetch<T: ProgramAccount>(&self, address: &Pubkey) -> Result<Option<T>> {
        let Some(data) = self.ledger.get_account_data(address).await? else {
            debug!(account = T::NAME, %address, "account not found");
            return Ok(None);
        };

        T::decode(&data).map(Some).map_err(|source| {
            error!(account = T::NAME, %address, %source, "account decode failed");
            ClientError::Decode {
                account: T::NAME,
                address: *address,
                source,
            }
        })
    }

    /// Like [`fetch`](Self::fetch) but absence is a `NotFound` error.
    pub async fn require<T: ProgramAccount>(&self, address: &Pubkey) -> Result<T> {
        self.fetch(address)
            .await?
            .ok_or_else(|| ClientError::NotFound {
                account: T::NAME,
                address: *address,
            })
    }

    pub async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        Ok(self.ledger.account_exists(address).await?)
    }

    pub async fn fetch_goal(&self, goal_hash: &GoalHash) -> Result<Option<Goal>> {
        let (goal, _) = self.deriver.find_goal_pda(goal_hash);
        self.fetch(&goal).await
    }

    pub async fn fetch_stake(&self, goal_hash: &GoalHash, staker: &Pubkey) -> Result<Option<Stake>> {
        let (goal, _) = self.deriver.find_goal_pda(goal_hash);
        let (stake, _) = self.deriver.find_stake_pda(&goal, staker);
        self.fetch(&stake).await
    }

    pub async fn load_view(&self, goal_hash: &GoalHash, staker: &Pubkey, now: i64) -> Result<StakeView> {
        let (goal_address, _) = self.deriver.find_goal_pda(goal_hash);
        let (stake_address, _) = self.deriver.find_stake_pda(&goal_address, staker);
        let goal: Goal = self.require(&goal_address).await?;
        let stake: Option<Stake> = self.fetch(&stake_address).await?;
        let allowed_actions = rules::allowed_actions(&goal, stake.as_ref(), staker, now);

        Ok(StakeView {
            goal_address,
            goal,
            stake_address,
            stake,
            allowed_actions,
        })
    }
}
