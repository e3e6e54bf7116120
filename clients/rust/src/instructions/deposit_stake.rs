use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use super::{required, StakingInstruction};
use crate::errors::ValidationError;
use crate::programs::{HABIT_STAKE_ID, TOKEN_PROGRAM_ID};

pub const DEPOSIT_STAKE_DISCRIMINATOR: [u8; 8] = [160, 167, 9, 220, 74, 243, 228, 43];

/// Accounts. Moves the opened amount from the staker into the stake escrow.
#[derive(Debug, Clone)]
pub struct DepositStake {
    pub staker: Pubkey,
    pub goal: Pubkey,
    pub stake: Pubkey,
    pub mint: Pubkey,
    pub staker_token_account: Pubkey,
    pub escrow_token_account: Pubkey,
    pub token_program: Pubkey,
}

impl DepositStake {
    pub fn instruction(&self) -> Instruction {
        self.instruction_with_program(HABIT_STAKE_ID)
    }

    pub fn instruction_with_program(&self, program_id: Pubkey) -> Instruction {
        Instruction {
            program_id,
            accounts: vec![
                AccountMeta::new(self.staker, true),
                AccountMeta::new_readonly(self.goal, false),
                AccountMeta::new(self.stake, false),
                AccountMeta::new_readonly(self.mint, false),
                AccountMeta::new(self.staker_token_account, false),
                AccountMeta::new(self.escrow_token_account, false),
                AccountMeta::new_readonly(self.token_program, false),
            ],
            data: StakingInstruction::DepositStake.pack(),
        }
    }
}

/// Instruction builder for `DepositStake`.
///
/// ### Accounts:
///
///   0. `[writable, signer]` staker
///   1. `[]` goal
///   2. `[writable]` stake
///   3. `[]` mint
///   4. `[writable]` staker_token_account
///   5. `[writable]` escrow_token_account
///   6. `[optional]` token_program (default to `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`)
#[derive(Clone, Debug, Default)]
pub struct DepositStakeBuilder {
    program_id: Option<Pubkey>,
    staker: Option<Pubkey>,
    goal: Option<Pubkey>,
    stake: Option<Pubkey>,
    mint: Option<Pubkey>,
    staker_token_account: Option<Pubkey>,
    escrow_token_account: Option<Pubkey>,
    token_program: Option<Pubkey>,
}

impl DepositStakeBuilder {
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
    pub fn mint(&mut self, mint: Pubkey) -> &mut Self {
        self.mint = Some(mint);
        self
    }
    pub fn staker_token_account(&mut self, staker_token_account: Pubkey) -> &mut Self {
        self.staker_token_account = Some(staker_token_account);
        self
    }
    pub fn escrow_token_account(&mut self, escrow_token_account: Pubkey) -> &mut Self {
        self.escrow_token_account = Some(escrow_token_account);
        self
    }
    pub fn token_program(&mut self, token_program: Pubkey) -> &mut Self {
        self.token_program = Some(token_program);
        self
    }

    pub fn instruction(&self) -> Result<Instruction, ValidationError> {
        let accounts = DepositStake {
            staker: required(self.staker, "staker")?,
            goal: required(self.goal, "goal")?,
            stake: required(self.stake, "stake")?,
            mint: required(self.mint, "mint")?,
            staker_token_account: required(self.staker_token_account, "staker_token_account")?,
            escrow_token_account: required(self.escrow_token_account, "escrow_token_account")?,
            token_program: self.token_program.unwrap_or(TOKEN_PROGRAM_ID),
        };
        Ok(accounts.instruction_with_program(self.program_id.unwrap_or(HABIT_STAKE_ID)))
    }
}
