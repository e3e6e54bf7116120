use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};

use crate::errors::ValidationError;

/// 32-byte content hash identifying a goal on chain.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct GoalHash(pub [u8; 32]);

impl GoalHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ValidationError::InvalidHashLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Hash of an off-chain goal identifier (database id, slug, ...).
    pub fn from_goal_id(goal_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(goal_id.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for GoalHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for GoalHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for GoalHash {
    type Err = ValidationError;

    /// Parses a 64 character hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ValidationError::InvalidHashHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}
