//! Caller side of the verifier: HTTP client and the sign, verify, record flow.

pub mod api;
pub mod flow;

pub use api::{ClientError, VerifierClient};
pub use flow::sign_and_record;
