use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;

use crate::pda::AddressDeriver;
use crate::programs::{ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID};

const CREATE_TAG: u8 = 0;

/// `Create` on the associated token account program. Fails if the account
/// already exists, so callers must check first.
pub fn create_token_account(
    deriver: &AddressDeriver,
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
) -> Instruction {
    let (token_account, _) = deriver.find_token_account(owner, mint);
    Instruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(token_account, false),
            AccountMeta::new_readonly(*owner, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            AccountMeta::new_readonly(deriver.token_program_id, false),
        ],
        data: vec![CREATE_TAG],
    }
}
