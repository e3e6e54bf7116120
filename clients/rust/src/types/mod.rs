pub mod goal_hash;
pub mod stake_status;

pub use goal_hash::*;
pub use stake_status::*;
