//! Address derivation for the staking program.
//!
//! Seeds here must match the program byte for byte. A mismatch does not fail,
//! it silently yields an address nobody owns.

use solana_sdk::pubkey::Pubkey;

use crate::programs::{ASSOCIATED_TOKEN_PROGRAM_ID, HABIT_STAKE_ID, TOKEN_PROGRAM_ID};
use crate::types::GoalHash;

pub const GOAL_SEED: &[u8] = b"goal";
pub const STAKE_SEED: &[u8] = b"stake";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    pub program_id: Pubkey,
    pub token_program_id: Pubkey,
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self::new(HABIT_STAKE_ID)
    }
}

impl AddressDeriver {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            token_program_id: TOKEN_PROGRAM_ID,
        }
    }

    pub fn find_goal_pda(&self, goal_hash: &GoalHash) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[GOAL_SEED, goal_hash.as_ref()], &self.program_id)
    }

    pub fn find_stake_pda(&self, goal: &Pubkey, staker: &Pubkey) -> (Pubkey, u8) {
        let seeds = &[STAKE_SEED, goal.as_ref(), staker.as_ref()];
        Pubkey::find_program_address(seeds, &self.program_id)
    }

    /// Associated token account for `(owner, mint)`. Owner may be off-curve.
    pub fn find_token_account(&self, owner: &Pubkey, mint: &Pubkey) -> (Pubkey, u8) {
        let seeds = &[owner.as_ref(), self.token_program_id.as_ref(), mint.as_ref()];
        Pubkey::find_program_address(seeds, &ASSOCIATED_TOKEN_PROGRAM_ID)
    }

    /// Escrow token account holding a funded stake.
    pub fn find_stake_escrow(&self, stake: &Pubkey, mint: &Pubkey) -> Pubkey {
        self.find_token_account(stake, mint).0
    }
}
