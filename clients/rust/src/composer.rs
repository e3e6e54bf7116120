//! Assembles the ordered instruction list for each staking action.
//!
//! Every action goes through [`InstructionPlan`]: token accounts the action
//! touches are checked first and a create instruction is queued only when
//! the account is missing. Setup instructions always precede the business
//! instructions and the order is never changed afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use solana_sdk::{
    instruction::Instruction, message::Message, pubkey::Pubkey, transaction::Transaction,
};
use tracing::{debug, info};

use crate::accounts::{Goal, Stake};
use crate::errors::{Result, ValidationError};
use crate::instructions::{
    create_token_account, CancelBeforeStartBuilder, DepositStakeBuilder, InitGoalBuilder,
    InitGoalInstructionArgs, OpenStakeBuilder, OpenStakeInstructionArgs, ResolveFailureBuilder,
    ResolveSuccessBuilder,
};
use crate::ledger::LedgerClient;
use crate::pda::AddressDeriver;
use crate::reader::AccountReader;
use crate::rules::{self, ActionKind};
use crate::types::GoalHash;

/// Parameters for creating a goal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalParams {
    pub goal_hash: GoalHash,
    pub starts_on: i64,
    pub ends_on: i64,
    /// Defaults to the authority.
    pub resolver: Option<Pubkey>,
    pub group_vault: Pubkey,
    pub mint: Pubkey,
}

impl GoalParams {
    fn instruction_args(&self, authority: &Pubkey) -> InitGoalInstructionArgs {
        InitGoalInstructionArgs {
            goal_hash: self.goal_hash,
            starts_on: self.starts_on,
            ends_on: self.ends_on,
            resolver: self.resolver.unwrap_or(*authority),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakeAction {
    InitGoal(GoalParams),
    OpenStake { goal_hash: GoalHash, amount: u64 },
    DepositStake { goal_hash: GoalHash },
    CancelBeforeStart { goal_hash: GoalHash },
    ResolveSuccess { goal_hash: GoalHash, staker: Pubkey },
    ResolveFailure { goal_hash: GoalHash, staker: Pubkey },
    CreateGoalAndStake { goal: GoalParams, amount: u64 },
}

impl StakeAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            StakeAction::InitGoal(_) => ActionKind::InitGoal,
            StakeAction::OpenStake { .. } => ActionKind::OpenStake,
            StakeAction::DepositStake { .. } => ActionKind::DepositStake,
            StakeAction::CancelBeforeStart { .. } => ActionKind::CancelBeforeStart,
            StakeAction::ResolveSuccess { .. } => ActionKind::ResolveSuccess,
            StakeAction::ResolveFailure { .. } => ActionKind::ResolveFailure,
            StakeAction::CreateGoalAndStake { .. } => ActionKind::CreateGoalAndStake,
        }
    }

    pub fn goal_hash(&self) -> &GoalHash {
        match self {
            StakeAction::InitGoal(goal) | StakeAction::CreateGoalAndStake { goal, .. } => {
                &goal.goal_hash
            }
            StakeAction::OpenStake { goal_hash, .. }
            | StakeAction::DepositStake { goal_hash }
            | StakeAction::CancelBeforeStart { goal_hash }
            | StakeAction::ResolveSuccess { goal_hash, .. }
            | StakeAction::ResolveFailure { goal_hash, .. } => goal_hash,
        }
    }

    /// Staker whose stake the action acts on when submitted by `signer`.
    pub fn staker(&self, signer: &Pubkey) -> Pubkey {
        match self {
            StakeAction::ResolveSuccess { staker, .. } | StakeAction::ResolveFailure { staker, .. } => {
                *staker
            }
            _ => *signer,
        }
    }

    /// Checks that need no ledger access.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        match self {
            StakeAction::InitGoal(goal) => goal.instruction_args(&Pubkey::default()).validate(),
            StakeAction::OpenStake { amount, .. } => {
                OpenStakeInstructionArgs { amount: *amount }.validate()
            }
            StakeAction::CreateGoalAndStake { goal, amount } => {
                goal.instruction_args(&Pubkey::default()).validate()?;
                OpenStakeInstructionArgs { amount: *amount }.validate()
            }
            _ => Ok(()),
        }
    }
}

/// Ordered instruction accumulator shared by every action.
pub struct InstructionPlan {
    payer: Pubkey,
    setup: Vec<Instruction>,
    body: Vec<Instruction>,
    checked: HashSet<Pubkey>,
}

impl InstructionPlan {
    pub fn new(payer: Pubkey) -> Self {
        Self {
            payer,
            setup: Vec::new(),
            body: Vec::new(),
            checked: HashSet::new(),
        }
    }

    /// Queues creation of the `(owner, mint)` token account if it does not
    /// exist yet and returns its address. Repeated calls for the same
    /// account are no-ops.
    pub async fn ensure_token_account(
        &mut self,
        ledger: &dyn LedgerClient,
        deriver: &AddressDeriver,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Pubkey> {
        let (token_account, _) = deriver.find_token_account(owner, mint);
        if !self.checked.insert(token_account) {
            return Ok(token_account);
        }
        if ledger.account_exists(&token_account).await? {
            debug!(%token_account, %owner, "token account exists");
        } else {
            debug!(%token_account, %owner, "queueing token account creation");
            self.setup
                .push(create_token_account(deriver, &self.payer, owner, mint));
        }
        Ok(token_account)
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.body.push(instruction);
    }

    pub fn setup_len(&self) -> usize {
        self.setup.len()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        let mut instructions = self.setup;
        instructions.extend(self.body);
        instructions
    }
}

#[derive(Clone)]
pub struct TransactionComposer {
    ledger: Arc<dyn LedgerClient>,
    reader: AccountReader,
    deriver: AddressDeriver,
}

impl TransactionComposer {
    pub fn new(ledger: Arc<dyn LedgerClient>, deriver: AddressDeriver) -> Self {
        let reader = AccountReader::new(ledger.clone(), deriver);
        Self {
            ledger,
            reader,
            deriver,
        }
    }

    pub fn reader(&self) -> &AccountReader {
        &self.reader
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    /// Ordered instructions for `action` submitted and paid for by `signer`.
    pub async fn compose(
        &self,
        signer: &Pubkey,
        action: &StakeAction,
        now: i64,
    ) -> Result<Vec<Instruction>> {
        action.validate()?;
        let instructions = match action {
            StakeAction::InitGoal(goal) => self.init_goal(signer, goal)?,
            StakeAction::OpenStake { goal_hash, amount } => {
                self.open_stake(signer, goal_hash, *amount)?
            }
            StakeAction::DepositStake { goal_hash } => self.deposit_stake(signer, goal_hash).await?,
            StakeAction::CancelBeforeStart { goal_hash } => {
                self.cancel_before_start(signer, goal_hash, now).await?
            }
            StakeAction::ResolveSuccess { goal_hash, staker } => {
                self.resolve_success(signer, goal_hash, staker, now).await?
            }
            StakeAction::ResolveFailure { goal_hash, staker } => {
                self.resolve_failure(signer, goal_hash, staker, now).await?
            }
            StakeAction::CreateGoalAndStake { goal, amount } => {
                self.create_goal_and_stake(signer, goal, *amount).await?
            }
        };
        info!(
            action = action.kind().name(),
            instructions = instructions.len(),
            "composed instructions"
        );
        Ok(instructions)
    }

    pub fn init_goal(&self, authority: &Pubkey, goal: &GoalParams) -> Result<Vec<Instruction>> {
        let mut plan = InstructionPlan::new(*authority);
        plan.push(self.init_goal_instruction(authority, goal)?);
        Ok(plan.into_instructions())
    }

    pub fn open_stake(
        &self,
        staker: &Pubkey,
        goal_hash: &GoalHash,
        amount: u64,
    ) -> Result<Vec<Instruction>> {
        let mut plan = InstructionPlan::new(*staker);
        plan.push(self.open_stake_instruction(staker, goal_hash, amount)?);
        Ok(plan.into_instructions())
    }

    pub async fn deposit_stake(&self, staker: &Pubkey, goal_hash: &GoalHash) -> Result<Vec<Instruction>> {
        let (goal_address, _) = self.deriver.find_goal_pda(goal_hash);
        let goal: Goal = self.reader.require(&goal_address).await?;

        let mut plan = InstructionPlan::new(*staker);
        let deposit = self
            .deposit_instruction(&mut plan, staker, &goal_address, &goal.mint)
            .await?;
        plan.push(deposit);
        Ok(plan.into_instructions())
    }

    pub async fn cancel_before_start(
        &self,
        staker: &Pubkey,
        goal_hash: &GoalHash,
        now: i64,
    ) -> Result<Vec<Instruction>> {
        let (goal_address, goal, stake_address, stake) = self.load_pair(goal_hash, staker).await?;
        rules::check_cancel(&goal, &stake, now)?;

        let mut plan = InstructionPlan::new(*staker);
        let staker_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, staker, &goal.mint)
            .await?;
        let escrow_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, &stake_address, &goal.mint)
            .await?;

        plan.push(
            CancelBeforeStartBuilder::new()
                .program_id(self.deriver.program_id)
                .staker(*staker)
                .goal(goal_address)
                .stake(stake_address)
                .mint(goal.mint)
                .staker_token_account(staker_token_account)
                .escrow_token_account(escrow_token_account)
                .token_program(self.deriver.token_program_id)
                .instruction()?,
        );
        Ok(plan.into_instructions())
    }

    pub async fn resolve_success(
        &self,
        resolver: &Pubkey,
        goal_hash: &GoalHash,
        staker: &Pubkey,
        now: i64,
    ) -> Result<Vec<Instruction>> {
        let (goal_address, goal, stake_address, stake) = self.load_pair(goal_hash, staker).await?;
        rules::check_resolver(&goal, resolver)?;
        rules::check_resolve(&goal, &stake, now)?;

        let mut plan = InstructionPlan::new(*resolver);
        let escrow_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, &stake_address, &goal.mint)
            .await?;
        let staker_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, staker, &goal.mint)
            .await?;

        plan.push(
            ResolveSuccessBuilder::new()
                .program_id(self.deriver.program_id)
                .resolver(*resolver)
                .goal(goal_address)
                .stake(stake_address)
                .staker(*staker)
                .mint(goal.mint)
                .escrow_token_account(escrow_token_account)
                .staker_token_account(staker_token_account)
                .token_program(self.deriver.token_program_id)
                .instruction()?,
        );
        Ok(plan.into_instructions())
    }

    pub async fn resolve_failure(
        &self,
        resolver: &Pubkey,
        goal_hash: &GoalHash,
        staker: &Pubkey,
        now: i64,
    ) -> Result<Vec<Instruction>> {
        let (goal_address, goal, stake_address, stake) = self.load_pair(goal_hash, staker).await?;
        rules::check_resolver(&goal, resolver)?;
        rules::check_resolve(&goal, &stake, now)?;

        let mut plan = InstructionPlan::new(*resolver);
        let escrow_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, &stake_address, &goal.mint)
            .await?;
        let vault_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, &goal.group_vault, &goal.mint)
            .await?;

        plan.push(
            ResolveFailureBuilder::new()
                .program_id(self.deriver.program_id)
                .resolver(*resolver)
                .goal(goal_address)
                .stake(stake_address)
                .mint(goal.mint)
                .escrow_token_account(escrow_token_account)
                .vault_token_account(vault_token_account)
                .token_program(self.deriver.token_program_id)
                .instruction()?,
        );
        Ok(plan.into_instructions())
    }

    /// Init, open and deposit in one atomic submission.
    pub async fn create_goal_and_stake(
        &self,
        authority: &Pubkey,
        goal: &GoalParams,
        amount: u64,
    ) -> Result<Vec<Instruction>> {
        let (goal_address, _) = self.deriver.find_goal_pda(&goal.goal_hash);

        let mut plan = InstructionPlan::new(*authority);
        let init = self.init_goal_instruction(authority, goal)?;
        let open = self.open_stake_instruction(authority, &goal.goal_hash, amount)?;
        let deposit = self
            .deposit_instruction(&mut plan, authority, &goal_address, &goal.mint)
            .await?;

        plan.push(init);
        plan.push(open);
        plan.push(deposit);
        Ok(plan.into_instructions())
    }

    /// Attaches the fee payer and a fresh blockhash. Call right before signing.
    pub async fn build_transaction(
        &self,
        instructions: &[Instruction],
        fee_payer: &Pubkey,
    ) -> Result<Transaction> {
        let blockhash = self.ledger.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(instructions, Some(fee_payer), &blockhash);
        Ok(Transaction::new_unsigned(message))
    }

    fn init_goal_instruction(&self, authority: &Pubkey, goal: &GoalParams) -> Result<Instruction> {
        let (goal_address, _) = self.deriver.find_goal_pda(&goal.goal_hash);
        let args = goal.instruction_args(authority);

        Ok(InitGoalBuilder::new()
            .program_id(self.deriver.program_id)
            .authority(*authority)
            .goal(goal_address)
            .group_vault(goal.group_vault)
            .mint(goal.mint)
            .goal_hash(args.goal_hash)
            .starts_on(args.starts_on)
            .ends_on(args.ends_on)
            .resolver(args.resolver)
            .instruction()?)
    }

    fn open_stake_instruction(
        &self,
        staker: &Pubkey,
        goal_hash: &GoalHash,
        amount: u64,
    ) -> Result<Instruction> {
        let (goal_address, _) = self.deriver.find_goal_pda(goal_hash);
        let (stake_address, _) = self.deriver.find_stake_pda(&goal_address, staker);

        Ok(OpenStakeBuilder::new()
            .program_id(self.deriver.program_id)
            .staker(*staker)
            .goal(goal_address)
            .stake(stake_address)
            .amount(amount)
            .instruction()?)
    }

    async fn deposit_instruction(
        &self,
        plan: &mut InstructionPlan,
        staker: &Pubkey,
        goal_address: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Instruction> {
        let (stake_address, _) = self.deriver.find_stake_pda(goal_address, staker);
        let staker_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, staker, mint)
            .await?;
        let escrow_token_account = plan
            .ensure_token_account(self.ledger.as_ref(), &self.deriver, &stake_address, mint)
            .await?;

        Ok(DepositStakeBuilder::new()
            .program_id(self.deriver.program_id)
            .staker(*staker)
            .goal(*goal_address)
            .stake(stake_address)
            .mint(*mint)
            .staker_token_account(staker_token_account)
            .escrow_token_account(escrow_token_account)
            .token_program(self.deriver.token_program_id)
            .instruction()?)
    }

    async fn load_pair(
        &self,
        goal_hash: &GoalHash,
        staker: &Pubkey,
    ) -> Result<(Pubkey, Goal, Pubkey, Stake)> {
        let (goal_address, _) = self.deriver.find_goal_pda(goal_hash);
        let (stake_address, _) = self.deriver.find_stake_pda(&goal_address, staker);
        let goal: Goal = self.reader.require(&goal_address).await?;
        let stake: Stake = self.reader.require(&stake_address).await?;
        Ok((goal_address, goal, stake_address, stake))
    }
}
