pub mod checksum;
pub mod codec;
pub mod config;
pub mod error;
pub mod normalize;
pub mod service;
pub mod signer;
pub mod types;
pub mod verify;
