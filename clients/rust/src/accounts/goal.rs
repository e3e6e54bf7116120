use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::{decode_account, encode_account, DISCRIMINATOR_LEN};
use crate::errors::DecodeError;
use crate::types::GoalHash;

pub const GOAL_DISCRIMINATOR: [u8; 8] = [163, 66, 166, 245, 130, 131, 207, 26];

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Goal {
    pub goal_hash: GoalHash,
    pub authority: Pubkey,
    pub resolver: Pubkey,
    pub group_vault: Pubkey,
    pub mint: Pubkey,
    pub starts_on: i64,
    pub ends_on: i64,
}

impl Goal {
    pub const LEN: usize = DISCRIMINATOR_LEN + 32 * 5 + 8 + 8;

    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        decode_account(data, &GOAL_DISCRIMINATOR, Self::LEN, "Goal")
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_account(self, &GOAL_DISCRIMINATOR, Self::LEN)
    }

    pub fn has_started(&self, now: i64) -> bool {
        now >= self.starts_on
    }

    pub fn has_ended(&self, now: i64) -> bool {
        now >= self.ends_on
    }
}
