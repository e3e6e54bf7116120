use solana_sdk::pubkey::Pubkey;

/// Deployed address of the habit staking program.
pub const HABIT_STAKE_ID: Pubkey =
    Pubkey::from_str_const("55NqZFNf4XwbPkSZokjnT2PSoDG7xJyMRof998XWgSHS");

pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");

pub const TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
