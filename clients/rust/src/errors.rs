use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

use crate::types::StakeStatus;

/// Machine-checkable classification of every terminal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Decode,
    SignerUnavailable,
    SignerRejected,
    Transport,
    ConfirmationTimeout,
    OnChainRejection,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Goal hash must be 32 bytes, got {0}")]
    InvalidHashLength(usize),
    #[error("Stake amount must be greater than zero")]
    ZeroAmount,
    #[error("Goal window is empty: starts_on {starts_on} must be before ends_on {ends_on}")]
    InvalidWindow { starts_on: i64, ends_on: i64 },
    #[error("Missing account: {0}")]
    MissingAccount(&'static str),
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("Goal hash is not valid hex: {0}")]
    InvalidHashHex(String),
    #[error("Tracker is not idle; restart it before running another action")]
    TrackerNotIdle,
}

/// Local mirror of the program's gating rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("Goal already started at {starts_on} (now {now})")]
    GoalAlreadyStarted { now: i64, starts_on: i64 },
    #[error("Goal has not ended yet, ends at {ends_on} (now {now})")]
    GoalNotEnded { now: i64, ends_on: i64 },
    #[error("Stake status {actual:?} does not allow this action")]
    InvalidStakeStatus { actual: StakeStatus },
    #[error("Signer {signer} is not the goal resolver {resolver}")]
    NotResolver { signer: Pubkey, resolver: Pubkey },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Account data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("Discriminator mismatch for {0}")]
    Discriminator(&'static str),
    #[error("Unknown stake status tag {0}")]
    UnknownStatus(u8),
    #[error("Unknown instruction discriminator {0:?}")]
    UnknownInstruction([u8; 8]),
    #[error("Unexpected trailing bytes in {0}")]
    TrailingBytes(&'static str),
    #[error("Malformed {account}: {message}")]
    Malformed {
        account: &'static str,
        message: String,
    },
}

/// Error surfaced by a ledger transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Ledger unreachable: {0}")]
    Transport(String),
    #[error("Transaction rejected: {message}")]
    Rejected {
        message: String,
        logs: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignerError {
    #[error("No signer available")]
    Unavailable,
    #[error("Signing request declined: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error("No {account} account at {address}")]
    NotFound {
        account: &'static str,
        address: Pubkey,
    },
    #[error("Failed to decode {account} at {address}: {source}")]
    Decode {
        account: &'static str,
        address: Pubkey,
        #[source]
        source: DecodeError,
    },
    #[error("No signer available")]
    SignerUnavailable,
    #[error("Signer declined the transaction: {0}")]
    SignerRejected(String),
    #[error("Ledger unreachable: {0}")]
    Transport(String),
    #[error("Transaction {signature} not confirmed after {attempts} attempts")]
    ConfirmationTimeout { signature: Signature, attempts: u32 },
    #[error("Transaction rejected by the program: {message}")]
    OnChainRejection {
        signature: Option<Signature>,
        message: String,
        logs: Vec<String>,
    },
    #[error("Action aborted before a definitive result")]
    Aborted { signature: Option<Signature> },
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) | ClientError::Rule(_) => ErrorKind::Validation,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Decode { .. } => ErrorKind::Decode,
            ClientError::SignerUnavailable => ErrorKind::SignerUnavailable,
            ClientError::SignerRejected(_) => ErrorKind::SignerRejected,
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::ConfirmationTimeout { .. } => ErrorKind::ConfirmationTimeout,
            ClientError::OnChainRejection { .. } => ErrorKind::OnChainRejection,
            ClientError::Aborted { .. } => ErrorKind::Aborted,
        }
    }

    /// Submission reference usable to look the transaction up later.
    pub fn signature(&self) -> Option<Signature> {
        match self {
            ClientError::ConfirmationTimeout { signature, .. } => Some(*signature),
            ClientError::OnChainRejection { signature, .. } => *signature,
            ClientError::Aborted { signature } => *signature,
            _ => None,
        }
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Transport(message) => ClientError::Transport(message),
            LedgerError::Rejected { message, logs } => ClientError::OnChainRejection {
                signature: None,
                message,
                logs,
            },
        }
    }
}

impl From<SignerError> for ClientError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::Unavailable => ClientError::SignerUnavailable,
            SignerError::Rejected(reason) => ClientError::SignerRejected(reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
