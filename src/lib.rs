//! Verification of Ethereum `personal_sign` signatures and a client-local
//! log of sign/verify attempts.

pub mod client;
pub mod common;
pub mod history;
pub mod test_utils;
