use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::errors::DecodeError;

/// Lifecycle of a stake. `Success`, `Failure` and `Canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum StakeStatus {
    Pending = 0,
    Funded = 1,
    Success = 2,
    Failure = 3,
    Canceled = 4,
}

impl StakeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StakeStatus::Success | StakeStatus::Failure | StakeStatus::Canceled
        )
    }

    pub fn can_transition_to(self, next: StakeStatus) -> bool {
        use StakeStatus::*;
        matches!(
            (self, next),
            (Pending, Funded)
                | (Funded, Success)
                | (Funded, Failure)
                | (Pending, Canceled)
                | (Funded, Canceled)
        )
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for StakeStatus {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        StakeStatus::from_u8(tag).ok_or(DecodeError::UnknownStatus(tag))
    }
}
