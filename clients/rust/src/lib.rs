//! Client for the habit-stake escrow program.
//!
//! Derives program addresses, encodes instructions, decodes accounts and
//! drives staking actions through sign, broadcast and confirmation.

pub mod accounts;
pub mod clock;
pub mod composer;
pub mod config;
pub mod errors;
pub mod instructions;
pub mod ledger;
pub mod orchestrator;
pub mod pda;
pub mod programs;
pub mod reader;
pub mod rules;
pub mod signer;
pub mod types;

pub use accounts::{Goal, Stake};
pub use clock::{Clock, SystemClock};
pub use composer::{GoalParams, InstructionPlan, StakeAction, TransactionComposer};
pub use config::{ClientConfig, ConfigError};
pub use errors::{
    ClientError, DecodeError, ErrorKind, LedgerError, Result, RuleViolation, SignerError,
    ValidationError,
};
pub use ledger::{Commitment, LedgerClient, RpcLedger, SignatureStatus};
pub use orchestrator::{
    AbortHandle, AbortSignal, ActionOrchestrator, ActionStatus, ActionTracker,
    ConfirmationPolicy, KeyedLocks,
};
pub use pda::AddressDeriver;
pub use programs::*;
pub use reader::{AccountReader, ProgramAccount, StakeView};
pub use rules::ActionKind;
pub use signer::{KeypairSigner, TransactionSigner};
pub use types::{GoalHash, StakeStatus};
