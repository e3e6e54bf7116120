use habit_stake_client::{Goal, Stake, StakeStatus};
use solana_sdk::{pubkey::Pubkey, signature::Signer};

use crate::setup::TestFixture;

#[allow(async_fn_in_trait)]
pub trait Accounts {
    fn goal_address(&self) -> Pubkey;
    fn stake_address(&self, staker: &Pubkey) -> Pubkey;
    fn escrow_address(&self) -> Pubkey;
    async fn get_goal(&self) -> Goal;
    async fn get_stake(&self) -> Option<Stake>;
    async fn stake_status(&self) -> StakeStatus;
    fn staker_balance(&self) -> u64;
    fn escrow_balance(&self) -> u64;
    fn vault_balance(&self) -> u64;
}

impl Accounts for TestFixture {
    fn goal_address(&self) -> Pubkey {
        self.deriver.find_goal_pda(&self.goal_hash).0
    }

    fn stake_address(&self, staker: &Pubkey) -> Pubkey {
        self.deriver.find_stake_pda(&self.goal_address(), staker).0
    }

    fn escrow_address(&self) -> Pubkey {
        let stake = self.stake_address(&self.staker.pubkey());
        self.deriver.find_stake_escrow(&stake, &self.mint)
    }

    async fn get_goal(&self) -> Goal {
        self.reader()
            .fetch_goal(&self.goal_hash)
            .await
            .expect("Failed to fetch goal")
            .expect("Goal account not found")
    }

    async fn get_stake(&self) -> Option<Stake> {
        self.reader()
            .fetch_stake(&self.goal_hash, &self.staker.pubkey())
            .await
            .expect("Failed to fetch stake")
    }

    async fn stake_status(&self) -> StakeStatus {
        self.get_stake().await.expect("Stake account not found").status
    }

    fn staker_balance(&self) -> u64 {
        self.ledger.token_balance(&self.staker.pubkey(), &self.mint)
    }

    fn escrow_balance(&self) -> u64 {
        let stake = self.stake_address(&self.staker.pubkey());
        self.ledger.token_balance(&stake, &self.mint)
    }

    fn vault_balance(&self) -> u64 {
        self.ledger.token_balance(&self.group_vault, &self.mint)
    }
}
