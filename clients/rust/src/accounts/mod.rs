pub mod goal;
pub mod stake;

pub use goal::*;
pub use stake::*;

use borsh::BorshDeserialize;

use crate::errors::DecodeError;

pub const DISCRIMINATOR_LEN: usize = 8;

/// Checks the account discriminator and decodes the fields that follow it.
/// Bytes past the last field are padding and ignored.
pub(crate) fn decode_account<T: BorshDeserialize>(
    data: &[u8],
    discriminator: &[u8; DISCRIMINATOR_LEN],
    min_len: usize,
    name: &'static str,
) -> Result<T, DecodeError> {
    if data.len() < min_len {
        return Err(DecodeError::TooShort {
            expected: min_len,
            actual: data.len(),
        });
    }
    if &data[..DISCRIMINATOR_LEN] != discriminator {
        return Err(DecodeError::Discriminator(name));
    }
    let mut body = &data[DISCRIMINATOR_LEN..];
    T::deserialize(&mut body).map_err(|e| DecodeError::Malformed {
        account: name,
        message: e.to_string(),
    })
}

pub(crate) fn encode_account<T: borsh::BorshSerialize>(
    value: &T,
    discriminator: &[u8; DISCRIMINATOR_LEN],
    len: usize,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(len);
    data.extend_from_slice(discriminator);
    borsh::to_writer(&mut data, value).expect("borsh serialization into a Vec");
    data
}
