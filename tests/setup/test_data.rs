use std::time::Duration;

// Clock
pub const NOW: i64 = 1_700_000_000;
pub const START_OFFSET: i64 = 60;
pub const END_OFFSET: i64 = 3_660;

// Goal test data
pub const DEFAULT_GOAL_ID: &str = "read-20-pages-daily";
pub const SECOND_GOAL_ID: &str = "run-5k-weekly";

// Token test data
pub const STAKE_AMOUNT: u64 = 1_000_000; // 1 token at 6 decimals
pub const INITIAL_BALANCE: u64 = 5_000_000;

// Confirmation
pub const CONFIRM_ATTEMPTS: u32 = 5;
pub const CONFIRM_INTERVAL: Duration = Duration::from_secs(1);
