use k256::ecdsa::SigningKey;
use personal_sign_verifier::common::signer::{LocalKeySigner, PRIVATE_KEY_FILE};
use rand::rngs::OsRng;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate a new secp256k1 key
    let signer = LocalKeySigner::new(SigningKey::random(&mut OsRng));

    fs::write(PRIVATE_KEY_FILE, format!("{}\n", signer.key_hex()))?;
    println!("Private key saved to {}", PRIVATE_KEY_FILE);
    println!("Address: {}", signer.checksummed_address());

    Ok(())
}
