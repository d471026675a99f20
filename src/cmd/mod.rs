pub mod args;
pub mod config;

mod crypto;
pub use crypto::CryptoArgs;
