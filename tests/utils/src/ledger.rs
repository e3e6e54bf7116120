//! In-memory ledger that runs the staking program's rules.
//!
//! Transactions apply atomically: every instruction succeeds or the whole
//! submission is rejected and state is left untouched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use habit_stake_client::{
    instructions::StakingInstruction, AddressDeriver, Clock, Commitment, Goal, LedgerClient,
    LedgerError, SignatureStatus, Stake, StakeStatus, ASSOCIATED_TOKEN_PROGRAM_ID,
};
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash, message::{compiled_instruction::CompiledInstruction, Message}, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};

pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Settable clock shared between a test and the ledger.
#[derive(Clone, Debug)]
pub struct TestClock(Arc<AtomicI64>);

impl TestClock {
    pub fn new(now: i64) -> Self {
        Self(Arc::new(AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenBalance {
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

impl TokenBalance {
    /// SPL token account layout: mint, owner, amount, ..., state at 108.
    fn to_bytes(&self) -> Vec<u8> {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[..32].copy_from_slice(self.mint.as_ref());
        data[32..64].copy_from_slice(self.owner.as_ref());
        data[64..72].copy_from_slice(&self.amount.to_le_bytes());
        data[108] = 1;
        data
    }
}

/// What happens to a submission after it is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfirmMode {
    #[default]
    Finalize,
    /// Applied, but its status is held back until
    /// [`MemoryLedger::release_withheld`].
    Withhold,
    /// Accepted by the node, then fails during execution.
    FailOnChain,
    /// Applied, but status requests never answer.
    Hang,
}

#[derive(Clone, Default)]
struct LedgerState {
    accounts: HashMap<Pubkey, Vec<u8>>,
    tokens: HashMap<Pubkey, TokenBalance>,
}

pub struct MemoryLedger {
    deriver: AddressDeriver,
    clock: TestClock,
    state: Mutex<LedgerState>,
    statuses: Mutex<HashMap<Signature, SignatureStatus>>,
    withheld: Mutex<HashMap<Signature, SignatureStatus>>,
    history: Mutex<HashMap<Signature, SignatureStatus>>,
    sent: Mutex<Vec<Transaction>>,
    confirm_mode: Mutex<ConfirmMode>,
    offline: AtomicBool,
    status_polls: AtomicUsize,
    blockhashes: AtomicU64,
}

impl MemoryLedger {
    pub fn new(deriver: AddressDeriver, clock: TestClock) -> Self {
        Self {
            deriver,
            clock,
            state: Mutex::new(LedgerState::default()),
            statuses: Mutex::new(HashMap::new()),
            withheld: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            confirm_mode: Mutex::new(ConfirmMode::Finalize),
            offline: AtomicBool::new(false),
            status_polls: AtomicUsize::new(0),
            blockhashes: AtomicU64::new(0),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_confirm_mode(&self, mode: ConfirmMode) {
        *self.confirm_mode.lock() = mode;
    }

    pub fn release_withheld(&self) {
        let released: Vec<_> = self.withheld.lock().drain().collect();
        self.statuses.lock().extend(released);
    }

    /// Ages every known status out of the recent cache. Only history
    /// lookups still find them.
    pub fn expire_recent_statuses(&self) {
        let expired: Vec<_> = self.statuses.lock().drain().collect();
        self.history.lock().extend(expired);
    }

    /// Credits `amount` to the `(owner, mint)` token account, creating it.
    pub fn mint_to(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let (address, _) = self.deriver.find_token_account(owner, mint);
        let mut state = self.state.lock();
        state
            .tokens
            .entry(address)
            .or_insert_with(|| TokenBalance {
                owner: *owner,
                mint: *mint,
                amount: 0,
            })
            .amount += amount;
        address
    }

    pub fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> u64 {
        let (address, _) = self.deriver.find_token_account(owner, mint);
        self.state
            .lock()
            .tokens
            .get(&address)
            .map_or(0, |balance| balance.amount)
    }

    pub fn has_token_account(&self, owner: &Pubkey, mint: &Pubkey) -> bool {
        let (address, _) = self.deriver.find_token_account(owner, mint);
        self.state.lock().tokens.contains_key(&address)
    }

    /// Overwrites raw account bytes, bypassing the program.
    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.state.lock().accounts.insert(address, data);
    }

    pub fn sent_transactions(&self) -> Vec<Transaction> {
        self.sent.lock().clone()
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        Ok(())
    }

    fn execute(&self, state: &mut LedgerState, message: &Message, now: i64) -> Result<(), String> {
        for (index, compiled) in message.instructions.iter().enumerate() {
            let ix = Invocation::resolve(message, compiled)?;
            let result = if ix.program_id == ASSOCIATED_TOKEN_PROGRAM_ID {
                self.create_token_account(state, &ix)
            } else if ix.program_id == self.deriver.program_id {
                self.run_program(state, &ix, now)
            } else {
                Err(format!("unsupported program {}", ix.program_id))
            };
            result.map_err(|e| format!("instruction {index} failed: {e}"))?;
        }
        Ok(())
    }

    fn create_token_account(&self, state: &mut LedgerState, ix: &Invocation) -> Result<(), String> {
        if ix.data != [0] {
            return Err("unsupported associated token instruction".into());
        }
        ix.signer(0)?;
        let address = ix.key(1)?;
        let owner = ix.key(2)?;
        let mint = ix.key(3)?;
        if self.deriver.find_token_account(&owner, &mint).0 != address {
            return Err("Provided seeds do not result in a valid address".into());
        }
        if state.tokens.contains_key(&address) {
            return Err(format!("account {address} already in use"));
        }
        state.tokens.insert(
            address,
            TokenBalance {
                owner,
                mint,
                amount: 0,
            },
        );
        Ok(())
    }

    fn run_program(&self, state: &mut LedgerState, ix: &Invocation, now: i64) -> Result<(), String> {
        let instruction = StakingInstruction::unpack(&ix.data).map_err(|e| e.to_string())?;
        match instruction {
            StakingInstruction::InitGoal(args) => {
                let authority = ix.signer(0)?;
                let goal_address = ix.key(1)?;
                args.validate().map_err(|e| e.to_string())?;
                if self.deriver.find_goal_pda(&args.goal_hash).0 != goal_address {
                    return Err("ConstraintSeeds: goal".into());
                }
                if state.accounts.contains_key(&goal_address) {
                    return Err(format!("account {goal_address} already in use"));
                }
                let goal = Goal {
                    goal_hash: args.goal_hash,
                    authority,
                    resolver: args.resolver,
                    group_vault: ix.key(2)?,
                    mint: ix.key(3)?,
                    starts_on: args.starts_on,
                    ends_on: args.ends_on,
                };
                state.accounts.insert(goal_address, goal.to_bytes());
            }
            StakingInstruction::OpenStake(args) => {
                let staker = ix.signer(0)?;
                let goal_address = ix.key(1)?;
                let stake_address = ix.key(2)?;
                args.validate().map_err(|e| e.to_string())?;
                load_goal(state, &goal_address)?;
                if self.deriver.find_stake_pda(&goal_address, &staker).0 != stake_address {
                    return Err("ConstraintSeeds: stake".into());
                }
                if state.accounts.contains_key(&stake_address) {
                    return Err(format!("account {stake_address} already in use"));
                }
                let stake = Stake {
                    goal: goal_address,
                    staker,
                    amount: args.amount,
                    status: StakeStatus::Pending,
                    created_at: now,
                };
                state.accounts.insert(stake_address, stake.to_bytes());
            }
            StakingInstruction::DepositStake => {
                let (staker, goal, stake_address, mut stake) = self.load_staker_accounts(state, ix)?;
                let staker_tokens = self.token_account(ix, 4, &staker, &goal.mint)?;
                let escrow = self.token_account(ix, 5, &stake_address, &goal.mint)?;
                transition(&mut stake, StakeStatus::Funded)?;
                transfer(state, &staker_tokens, &escrow, stake.amount)?;
                state.accounts.insert(stake_address, stake.to_bytes());
            }
            StakingInstruction::CancelBeforeStart => {
                let (staker, goal, stake_address, mut stake) = self.load_staker_accounts(state, ix)?;
                let staker_tokens = self.token_account(ix, 4, &staker, &goal.mint)?;
                let escrow = self.token_account(ix, 5, &stake_address, &goal.mint)?;
                if goal.has_started(now) {
                    return Err("GoalAlreadyStarted".into());
                }
                let funded = stake.status == StakeStatus::Funded;
                transition(&mut stake, StakeStatus::Canceled)?;
                if funded {
                    transfer(state, &escrow, &staker_tokens, stake.amount)?;
                }
                state.accounts.insert(stake_address, stake.to_bytes());
            }
            StakingInstruction::ResolveSuccess => {
                let (goal, stake_address, mut stake) = self.load_resolver_accounts(state, ix, now)?;
                let staker = ix.key(3)?;
                if staker != stake.staker {
                    return Err("ConstraintHasOne: staker".into());
                }
                let escrow = self.token_account(ix, 5, &stake_address, &goal.mint)?;
                let staker_tokens = self.token_account(ix, 6, &staker, &goal.mint)?;
                transition(&mut stake, StakeStatus::Success)?;
                transfer(state, &escrow, &staker_tokens, stake.amount)?;
                state.accounts.insert(stake_address, stake.to_bytes());
            }
            StakingInstruction::ResolveFailure => {
                let (goal, stake_address, mut stake) = self.load_resolver_accounts(state, ix, now)?;
                let escrow = self.token_account(ix, 4, &stake_address, &goal.mint)?;
                let vault_tokens = self.token_account(ix, 5, &goal.group_vault, &goal.mint)?;
                transition(&mut stake, StakeStatus::Failure)?;
                transfer(state, &escrow, &vault_tokens, stake.amount)?;
                state.accounts.insert(stake_address, stake.to_bytes());
            }
        }
        Ok(())
    }

    /// Staker-signed layout: staker, goal, stake, mint, ...
    fn load_staker_accounts(
        &self,
        state: &LedgerState,
        ix: &Invocation,
    ) -> Result<(Pubkey, Goal, Pubkey, Stake), String> {
        let staker = ix.signer(0)?;
        let goal_address = ix.key(1)?;
        let stake_address = ix.key(2)?;
        let goal = load_goal(state, &goal_address)?;
        let stake = load_stake(state, &stake_address)?;
        if stake.staker != staker || stake.goal != goal_address {
            return Err("ConstraintHasOne: stake".into());
        }
        if ix.key(3)? != goal.mint {
            return Err("ConstraintAddress: mint".into());
        }
        Ok((staker, goal, stake_address, stake))
    }

    fn load_resolver_accounts(
        &self,
        state: &LedgerState,
        ix: &Invocation,
        now: i64,
    ) -> Result<(Goal, Pubkey, Stake), String> {
        let resolver = ix.signer(0)?;
        let goal_address = ix.key(1)?;
        let stake_address = ix.key(2)?;
        let goal = load_goal(state, &goal_address)?;
        let stake = load_stake(state, &stake_address)?;
        if goal.resolver != resolver {
            return Err("Unauthorized resolver".into());
        }
        if stake.goal != goal_address {
            return Err("ConstraintHasOne: stake".into());
        }
        if !goal.has_ended(now) {
            return Err("GoalNotEnded".into());
        }
        Ok((goal, stake_address, stake))
    }

    fn token_account(
        &self,
        ix: &Invocation,
        position: usize,
        owner: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Pubkey, String> {
        let address = ix.key(position)?;
        if self.deriver.find_token_account(owner, mint).0 != address {
            return Err(format!("token account {address} is not the ATA of {owner}"));
        }
        Ok(address)
    }
}

struct Invocation {
    program_id: Pubkey,
    keys: Vec<Pubkey>,
    signers: Vec<bool>,
    data: Vec<u8>,
}

impl Invocation {
    fn resolve(message: &Message, compiled: &CompiledInstruction) -> Result<Self, String> {
        let lookup = |index: u8| {
            message
                .account_keys
                .get(index as usize)
                .copied()
                .ok_or_else(|| format!("account index {index} out of range"))
        };
        let program_id = lookup(compiled.program_id_index)?;
        let keys = compiled
            .accounts
            .iter()
            .map(|index| lookup(*index))
            .collect::<Result<Vec<_>, _>>()?;
        let signers = compiled
            .accounts
            .iter()
            .map(|index| message.is_signer(*index as usize))
            .collect();
        Ok(Self {
            program_id,
            keys,
            signers,
            data: compiled.data.clone(),
        })
    }

    fn key(&self, position: usize) -> Result<Pubkey, String> {
        self.keys
            .get(position)
            .copied()
            .ok_or_else(|| "NotEnoughAccountKeys".to_string())
    }

    fn signer(&self, position: usize) -> Result<Pubkey, String> {
        let key = self.key(position)?;
        if !self.signers[position] {
            return Err(format!("missing required signature for {key}"));
        }
        Ok(key)
    }
}

fn load_goal(state: &LedgerState, address: &Pubkey) -> Result<Goal, String> {
    let data = state
        .accounts
        .get(address)
        .ok_or("AccountNotInitialized: goal")?;
    Goal::from_bytes(data).map_err(|e| e.to_string())
}

fn load_stake(state: &LedgerState, address: &Pubkey) -> Result<Stake, String> {
    let data = state
        .accounts
        .get(address)
        .ok_or("AccountNotInitialized: stake")?;
    Stake::from_bytes(data).map_err(|e| e.to_string())
}

fn transition(stake: &mut Stake, next: StakeStatus) -> Result<(), String> {
    if !stake.status.can_transition_to(next) {
        return Err(format!("InvalidStatus: {:?} -> {:?}", stake.status, next));
    }
    stake.status = next;
    Ok(())
}

fn transfer(state: &mut LedgerState, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<(), String> {
    if !state.tokens.contains_key(to) {
        return Err(format!("token account {to} not initialized"));
    }
    let source = state
        .tokens
        .get_mut(from)
        .ok_or_else(|| format!("token account {from} not initialized"))?;
    source.amount = source
        .amount
        .checked_sub(amount)
        .ok_or("insufficient funds")?;
    if let Some(destination) = state.tokens.get_mut(to) {
        destination.amount += amount;
    }
    Ok(())
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        self.check_online()?;
        let state = self.state.lock();
        Ok(state
            .accounts
            .get(address)
            .cloned()
            .or_else(|| state.tokens.get(address).map(TokenBalance::to_bytes)))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.check_online()?;
        let next = self.blockhashes.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&next.to_le_bytes());
        Ok(Hash::new_from_array(bytes))
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError> {
        self.check_online()?;
        let signature = transaction
            .signatures
            .first()
            .copied()
            .filter(|_| transaction.signatures.iter().all(|s| *s != Signature::default()))
            .ok_or_else(|| LedgerError::Rejected {
                message: "signature verification failed".into(),
                logs: Vec::new(),
            })?;

        let now = self.clock.now();
        let mode = *self.confirm_mode.lock();
        {
            let mut state = self.state.lock();
            let mut next = state.clone();
            if let Err(message) = self.execute(&mut next, &transaction.message, now) {
                return Err(LedgerError::Rejected {
                    logs: vec![format!("Program log: {message}")],
                    message,
                });
            }
            if mode != ConfirmMode::FailOnChain {
                *state = next;
            }
        }
        self.sent.lock().push(transaction.clone());

        match mode {
            ConfirmMode::Finalize => {
                self.statuses
                    .lock()
                    .insert(signature, SignatureStatus::Landed(Commitment::Finalized));
            }
            ConfirmMode::Withhold | ConfirmMode::Hang => {
                self.withheld
                    .lock()
                    .insert(signature, SignatureStatus::Landed(Commitment::Finalized));
            }
            ConfirmMode::FailOnChain => {
                self.statuses.lock().insert(
                    signature,
                    SignatureStatus::Failed("InstructionError(0, Custom(6000))".into()),
                );
            }
        }
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.check_online()?;
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.confirm_mode.lock();
        if mode == ConfirmMode::Hang {
            std::future::pending::<()>().await;
        }
        Ok(self.statuses.lock().get(signature).cloned())
    }

    async fn get_signature_status_with_history(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        if let Some(status) = self.get_signature_status(signature).await? {
            return Ok(Some(status));
        }
        Ok(self.history.lock().get(signature).cloned())
    }
}
