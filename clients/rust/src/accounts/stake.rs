use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::{decode_account, encode_account, DISCRIMINATOR_LEN};
use crate::errors::DecodeError;
use crate::types::StakeStatus;

pub const STAKE_DISCRIMINATOR: [u8; 8] = [150, 197, 176, 29, 55, 132, 112, 149];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    pub goal: Pubkey,
    pub staker: Pubkey,
    pub amount: u64,
    pub status: StakeStatus,
    pub created_at: i64,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct StakeLayout {
    goal: Pubkey,
    staker: Pubkey,
    amount: u64,
    status: u8,
    created_at: i64,
}

impl Stake {
    pub const LEN: usize = DISCRIMINATOR_LEN + 32 + 32 + 8 + 1 + 8;

    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        let layout: StakeLayout = decode_account(data, &STAKE_DISCRIMINATOR, Self::LEN, "Stake")?;
        Ok(Self {
            goal: layout.goal,
            staker: layout.staker,
            amount: layout.amount,
            status: StakeStatus::try_from(layout.status)?,
            created_at: layout.created_at,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let layout = StakeLayout {
            goal: self.goal,
            staker: self.staker,
            amount: self.amount,
            status: self.status.as_u8(),
            created_at: self.created_at,
        };
        encode_account(&layout, &STAKE_DISCRIMINATOR, Self::LEN)
    }
}
