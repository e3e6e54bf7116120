//! Instruction codec and account-meta builders for each program action.

pub mod cancel_before_start;
pub mod create_token_account;
pub mod deposit_stake;
pub mod init_goal;
pub mod open_stake;
pub mod resolve_failure;
pub mod resolve_success;

pub use cancel_before_start::*;
pub use create_token_account::*;
pub use deposit_stake::*;
pub use init_goal::*;
pub use open_stake::*;
pub use resolve_failure::*;
pub use resolve_success::*;

use solana_sdk::pubkey::Pubkey;

use crate::errors::{DecodeError, ValidationError};

pub(crate) fn required(
    account: Option<Pubkey>,
    name: &'static str,
) -> Result<Pubkey, ValidationError> {
    account.ok_or(ValidationError::MissingAccount(name))
}

/// Decoded form of every instruction the program accepts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StakingInstruction {
    InitGoal(InitGoalInstructionArgs),
    OpenStake(OpenStakeInstructionArgs),
    DepositStake,
    CancelBeforeStart,
    ResolveSuccess,
    ResolveFailure,
}

impl StakingInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            StakingInstruction::InitGoal(_) => "init_goal",
            StakingInstruction::OpenStake(_) => "open_stake",
            StakingInstruction::DepositStake => "deposit_stake",
            StakingInstruction::CancelBeforeStart => "cancel_before_start",
            StakingInstruction::ResolveSuccess => "resolve_success",
            StakingInstruction::ResolveFailure => "resolve_failure",
        }
    }

    pub fn discriminator(&self) -> [u8; 8] {
        match self {
            StakingInstruction::InitGoal(_) => INIT_GOAL_DISCRIMINATOR,
            StakingInstruction::OpenStake(_) => OPEN_STAKE_DISCRIMINATOR,
            StakingInstruction::DepositStake => DEPOSIT_STAKE_DISCRIMINATOR,
            StakingInstruction::CancelBeforeStart => CANCEL_BEFORE_START_DISCRIMINATOR,
            StakingInstruction::ResolveSuccess => RESOLVE_SUCCESS_DISCRIMINATOR,
            StakingInstruction::ResolveFailure => RESOLVE_FAILURE_DISCRIMINATOR,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = self.discriminator().to_vec();
        let args = match self {
            StakingInstruction::InitGoal(args) => borsh::to_vec(args),
            StakingInstruction::OpenStake(args) => borsh::to_vec(args),
            _ => Ok(Vec::new()),
        };
        data.extend(args.expect("borsh serialization into a Vec"));
        data
    }

    pub fn unpack(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < 8 {
            return Err(DecodeError::TooShort {
                expected: 8,
                actual: data.len(),
            });
        }
        let (tag, rest) = data.split_at(8);
        let mut discriminator = [0u8; 8];
        discriminator.copy_from_slice(tag);

        let no_fields = |instruction: StakingInstruction| {
            if rest.is_empty() {
                Ok(instruction)
            } else {
                Err(DecodeError::TrailingBytes(instruction.name()))
            }
        };

        match discriminator {
            INIT_GOAL_DISCRIMINATOR => borsh::from_slice(rest)
                .map(StakingInstruction::InitGoal)
                .map_err(|e| DecodeError::Malformed {
                    account: "init_goal",
                    message: e.to_string(),
                }),
            OPEN_STAKE_DISCRIMINATOR => borsh::from_slice(rest)
                .map(StakingInstruction::OpenStake)
                .map_err(|e| DecodeError::Malformed {
                    account: "open_stake",
                    message: e.to_string(),
                }),
            DEPOSIT_STAKE_DISCRIMINATOR => no_fields(StakingInstruction::DepositStake),
            CANCEL_BEFORE_START_DISCRIMINATOR => no_fields(StakingInstruction::CancelBeforeStart),
            RESOLVE_SUCCESS_DISCRIMINATOR => no_fields(StakingInstruction::ResolveSuccess),
            RESOLVE_FAILURE_DISCRIMINATOR => no_fields(StakingInstruction::ResolveFailure),
            other => Err(DecodeError::UnknownInstruction(other)),
        }
    }
}
