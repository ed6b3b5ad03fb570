use crate::common::signer::LocalKeySigner;
use crate::common::types::VerifyRequest;
use serde_json::json;

/// Fixed key used across tests.
pub const TEST_PRIVATE_KEY: &str =
    "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

/// Address belonging to [`TEST_PRIVATE_KEY`].
pub const TEST_ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

pub fn test_signer() -> LocalKeySigner {
    LocalKeySigner::from_hex(TEST_PRIVATE_KEY).expect("test key is valid")
}

/// Creates a verify request signed by the test key
pub fn create_signed_request(message: &str) -> VerifyRequest {
    let signature = test_signer()
        .sign_personal(message)
        .expect("signing with the test key succeeds");

    VerifyRequest {
        message: message.to_string(),
        signature,
    }
}

/// JSON body for a verify request signed by the test key
pub fn create_signed_body(message: &str) -> String {
    let VerifyRequest { message, signature } = create_signed_request(message);
    json!({ "message": message, "signature": signature }).to_string()
}
