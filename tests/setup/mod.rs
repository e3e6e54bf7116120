#![allow(dead_code)]
pub mod accounts;
pub mod fixture;
pub mod test_data;

pub use accounts::*;
pub use actions::*;
pub use fixture::*;
