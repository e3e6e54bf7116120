use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use super::{required, StakingInstruction};
use crate::errors::ValidationError;
use crate::programs::{HABIT_STAKE_ID, SYSTEM_PROGRAM_ID};
use crate::types::GoalHash;

pub const INIT_GOAL_DISCRIMINATOR: [u8; 8] = [214, 233, 13, 83, 203, 25, 9, 249];

/// Accounts.
#[derive(Debug, Clone)]
pub struct InitGoal {
    pub authority: Pubkey,
    pub goal: Pubkey,
    pub group_vault: Pubkey,
    pub mint: Pubkey,
    pub system_program: Pubkey,
}

impl InitGoal {
    pub fn instruction(&self, args: InitGoalInstructionArgs) -> Instruction {
        self.instruction_with_program(HABIT_STAKE_ID, args)
    }

    pub fn instruction_with_program(
        &self,
        program_id: Pubkey,
        args: InitGoalInstructionArgs,
    ) -> Instruction {
        let accounts = vec![
            AccountMeta::new(self.authority, true),
            AccountMeta::new(self.goal, false),
            AccountMeta::new_readonly(self.group_vault, false),
            AccountMeta::new_readonly(self.mint, false),
            AccountMeta::new_readonly(self.system_program, false),
        ];
        Instruction {
            program_id,
            accounts,
            data: StakingInstruction::InitGoal(args).pack(),
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct InitGoalInstructionArgs {
    pub goal_hash: GoalHash,
    pub starts_on: i64,
    pub ends_on: i64,
    pub resolver: Pubkey,
}

impl InitGoalInstructionArgs {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.starts_on >= self.ends_on {
            return Err(ValidationError::InvalidWindow {
                starts_on: self.starts_on,
                ends_on: self.ends_on,
            });
        }
        Ok(())
    }
}

/// Instruction builder for `InitGoal`.
///
/// ### Accounts:
///
///   0. `[writable, signer]` authority
///   1. `[writable]` goal
///   2. `[]` group_vault
///   3. `[]` mint
///   4. `[optional]` system_program (default to `11111111111111111111111111111111`)
#[derive(Clone, Debug, Default)]
pub struct InitGoalBuilder {
    program_id: Option<Pubkey>,
    authority: Option<Pubkey>,
    goal: Option<Pubkey>,
    group_vault: Option<Pubkey>,
    mint: Option<Pubkey>,
    system_program: Option<Pubkey>,
    goal_hash: Option<GoalHash>,
    starts_on: Option<i64>,
    ends_on: Option<i64>,
    resolver: Option<Pubkey>,
}

impl InitGoalBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn program_id(&mut self, program_id: Pubkey) -> &mut Self {
        self.program_id = Some(program_id);
        self
    }
    pub fn authority(&mut self, authority: Pubkey) -> &mut Self {
        self.authority = Some(authority);
        self
    }
    pub fn goal(&mut self, goal: Pubkey) -> &mut Self {
        self.goal = Some(goal);
        self
    }
    pub fn group_vault(&mut self, group_vault: Pubkey) -> &mut Self {
        self.group_vault = Some(group_vault);
        self
    }
    pub fn mint(&mut self, mint: Pubkey) -> &mut Self {
        self.mint = Some(mint);
        self
    }
    /// `[optional account, default to '11111111111111111111111111111111']`
    pub fn system_program(&mut self, system_program: Pubkey) -> &mut Self {
        self.system_program = Some(system_program);
        self
    }
    pub fn goal_hash(&mut self, goal_hash: GoalHash) -> &mut Self {
        self.goal_hash = Some(goal_hash);
        self
    }
    pub fn starts_on(&mut self, starts_on: i64) -> &mut Self {
        self.starts_on = Some(starts_on);
        self
    }
    pub fn ends_on(&mut self, ends_on: i64) -> &mut Self {
        self.ends_on = Some(ends_on);
        self
    }
    /// Defaults to the authority when unset.
    pub fn resolver(&mut self, resolver: Pubkey) -> &mut Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn instruction(&self) -> Result<Instruction, ValidationError> {
        let authority = required(self.authority, "authority")?;
        let accounts = InitGoal {
            authority,
            goal: required(self.goal, "goal")?,
            group_vault: required(self.group_vault, "group_vault")?,
            mint: required(self.mint, "mint")?,
            system_program: self.system_program.unwrap_or(SYSTEM_PROGRAM_ID),
        };
        let args = InitGoalInstructionArgs {
            goal_hash: self
                .goal_hash
                .ok_or(ValidationError::MissingArgument("goal_hash"))?,
            starts_on: self
                .starts_on
                .ok_or(ValidationError::MissingArgument("starts_on"))?,
            ends_on: self
                .ends_on
                .ok_or(ValidationError::MissingArgument("ends_on"))?,
            resolver: self.resolver.unwrap_or(authority),
        };
        args.validate()?;
        Ok(accounts.instruction_with_program(self.program_id.unwrap_or(HABIT_STAKE_ID), args))
    }
}
