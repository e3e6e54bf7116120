use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use super::{required, StakingInstruction};
use crate::errors::ValidationError;
use crate::programs::{HABIT_STAKE_ID, SYSTEM_PROGRAM_ID};

pub const OPEN_STAKE_DISCRIMINATOR: [u8; 8] = [136, 215, 163, 130, 234, 194, 229, 229];

/// Accounts.
#[derive(Debug, Clone)]
pub struct OpenStake {
    pub staker: Pubkey,
    pub goal: Pubkey,
    pub stake: Pubkey,
    pub system_program: Pubkey,
}

impl OpenStake {
    pub fn instruction(&self, args: OpenStakeInstructionArgs) -> Instruction {
        self.instruction_with_program(HABIT_STAKE_ID, args)
    }

    pub fn instruction_with_program(
        &self,
        program_id: Pubkey,
        args: OpenStakeInstructionArgs,
    ) -> Instruction {
        Instruction {
            program_id,
            accounts: vec![
                AccountMeta::new(self.staker, true),
                AccountMeta::new_readonly(self.goal, false),
                AccountMeta::new(self.stake, false),
                AccountMeta::new_readonly(self.system_program, false),
            ],
            data: StakingInstruction::OpenStake(args).pack(),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct OpenStakeInstructionArgs {
    pub amount: u64,
}

impl OpenStakeInstructionArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.amount == 0 {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(())
    }
}

/// Instruction builder for `OpenStake`.
///
/// ### Accounts:
///
///   0. `[writable, signer]` staker
///   1. `[]` goal
///   2. `[writable]` stake
///   3. `[optional]` system_program (default to `11111111111111111111111111111111`)
#[derive(Clone, Debug, Default)]
pub struct OpenStakeBuilder {
    program_id: Option<Pubkey>,
    staker: Option<Pubkey>,
    goal: Option<Pubkey>,
    stake: Option<Pubkey>,
    system_program: Option<Pubkey>,
    amount: Option<u64>,
}

impl OpenStakeBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn program_id(&mut self, program_id: Pubkey) -> &mut Self {
        self.program_id = Some(program_id);
        self
    }
    pub fn staker(&mut self, staker: Pubkey) -> &mut Self {
        self.staker = Some(staker);
        self
    }
    pub fn goal(&mut self, goal: Pubkey) -> &mut Self {
        self.goal = Some(goal);
        self
    }
    pub fn stake(&mut self, stake: Pubkey) -> &mut Self {
        self.stake = Some(stake);
        self
    }
    pub fn system_program(&mut self, system_program: Pubkey) -> &mut Self {
        self.system_program = Some(system_program);
        self
    }
    pub fn amount(&mut self, amount: u64) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn instruction(&self) -> Result<Instruction, ValidationError> {
        let accounts = OpenStake {
            staker: required(self.staker, "staker")?,
            goal: required(self.goal, "goal")?,
            stake: required(self.stake, "stake")?,
            system_program: self.system_program.unwrap_or(SYSTEM_PROGRAM_ID),
        };
        let args = OpenStakeInstructionArgs {
            amount: self
                .amount
                .ok_or(ValidationError::MissingArgument("amount"))?,
        };
        args.validate()?;
        Ok(accounts.instruction_with_program(self.program_id.unwrap_or(HABIT_STAKE_ID), args))
    }
}
