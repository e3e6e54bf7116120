use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

use crate::errors::SignerError;

/// Interactive approval step. Wallet adapters implement this; the
/// orchestrator never holds key material itself.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Address that pays for and signs submissions.
    fn address(&self) -> Result<Pubkey, SignerError>;

    /// Returns the signed transaction, or why it was not signed.
    async fn sign(&self, transaction: Transaction) -> Result<Transaction, SignerError>;
}

/// Local keypair that approves every request.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn address(&self) -> Result<Pubkey, SignerError> {
        Ok(self.keypair.pubkey())
    }

    async fn sign(&self, mut transaction: Transaction) -> Result<Transaction, SignerError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| SignerError::Rejected(e.to_string()))?;
        Ok(transaction)
    }
}
