use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BlockmodeError {
    #[error("Invalid key `{key}` for {cipher}: {reason}")]
    InvalidKey {
        cipher: &'static str,
        key: String,
        reason: String,
    },

    #[error("Invalid IV or nonce `{0}`, need a decimal or `0x` prefixed hexadecimal integer")]
    InvalidIv(String),

    #[error("Need to specify one of `--encrypt` or `--decrypt` in {0} mode")]
    MissingDirection(String),

    #[error("Need to specify an IV when decrypting in {0} mode")]
    MissingIv(String),

    #[error("Unsupported cipher `{0}`, need one of `sdes` or `saes`")]
    UnsupportedCipher(String),
}
