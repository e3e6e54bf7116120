//! Ledger access consumed by the reader, composer and orchestrator.

pub mod rpc;

pub use rpc::RpcLedger;

use async_trait::async_trait;
use serde::Deserialize;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};

use crate::errors::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(format!("unknown commitment level {other}")),
        }
    }
}

/// Status of a submitted transaction as last reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Landed(Commitment),
    Failed(String),
}

impl SignatureStatus {
    /// True once the transaction has reached at least `target`.
    pub fn satisfies(&self, target: Commitment) -> bool {
        match self {
            SignatureStatus::Landed(level) => *level >= target,
            SignatureStatus::Failed(_) => false,
        }
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Raw account bytes, `None` when nothing lives at `address`.
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, LedgerError> {
        Ok(self.get_account_data(address).await?.is_some())
    }

    /// Freshness token for the next submission.
    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError>;

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, LedgerError>;

    /// `None` while the ledger has no record of the signature yet. Only
    /// recent statuses are consulted.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError>;

    /// Same as [`get_signature_status`](Self::get_signature_status) but also
    /// searches statuses that have aged out of the recent cache.
    async fn get_signature_status_with_history(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, LedgerError> {
        self.get_signature_status(signature).await
    }
}
