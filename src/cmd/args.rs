use std::str::FromStr;

use cipher::{Direction, Mode};
use clap::ValueEnum;

use crate::error::BlockmodeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CipherType {
    SDES,
    SAES,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeType {
    #[value(name = "ecb", help = "The Electronic Codebook Mode")]
    ECB,
    #[value(name = "cbc", help = "The Cipher Block Chaining Mode")]
    CBC,
    #[value(name = "ctr", help = "The Counter Mode")]
    CTR,
}

impl CipherType {
    pub const fn name(self) -> &'static str {
        match self {
            CipherType::SDES => "sdes",
            CipherType::SAES => "saes",
        }
    }

    /// S-DES的密钥是二进制串, S-AES的密钥是十六进制串(可带`0x`前缀)
    pub fn parse_key(self, key: &str) -> Result<u64, BlockmodeError> {
        let (digits, radix) = match self {
            CipherType::SDES => (key, 2),
            CipherType::SAES => (strip_hex(key).unwrap_or(key), 16),
        };

        u64::from_str_radix(digits, radix).map_err(|e| BlockmodeError::InvalidKey {
            cipher: self.name(),
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

impl FromStr for CipherType {
    type Err = BlockmodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sdes" => Ok(CipherType::SDES),
            "saes" => Ok(CipherType::SAES),
            _ => Err(BlockmodeError::UnsupportedCipher(s.to_string())),
        }
    }
}

impl From<ModeType> for Mode {
    fn from(value: ModeType) -> Self {
        match value {
            ModeType::ECB => Mode::ECB,
            ModeType::CBC => Mode::CBC,
            ModeType::CTR => Mode::CTR,
        }
    }
}

fn strip_hex(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

/// 十进制或`0x`前缀的十六进制整数
pub fn parse_iv(s: &str) -> Result<u64, BlockmodeError> {
    match strip_hex(s) {
        Some(h) => u64::from_str_radix(h, 16),
        None => s.parse::<u64>(),
    }
    .map_err(|_| BlockmodeError::InvalidIv(s.to_string()))
}

/// ECB/CBC必须且只能指定一个方向, CTR的加解密是同一个运算
pub fn direction(mode: Mode, encrypt: bool, decrypt: bool) -> Result<Direction, BlockmodeError> {
    match (mode, encrypt, decrypt) {
        (_, true, false) => Ok(Direction::Encrypt),
        (_, false, true) => Ok(Direction::Decrypt),
        (Mode::CTR, _, _) => Ok(Direction::Encrypt),
        (mode, _, _) => Err(BlockmodeError::MissingDirection(mode.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::{direction, parse_iv, CipherType};
    use crate::error::BlockmodeError;
    use cipher::{Direction, Mode};

    #[test]
    fn cipher_name_ignores_case() {
        assert_eq!("SDES".parse::<CipherType>().unwrap(), CipherType::SDES);
        assert_eq!("sAeS".parse::<CipherType>().unwrap(), CipherType::SAES);
        assert!(matches!(
            "des".parse::<CipherType>(),
            Err(BlockmodeError::UnsupportedCipher(_))
        ));
    }

    #[test]
    fn key_text_per_cipher() {
        assert_eq!(CipherType::SDES.parse_key("1010000010").unwrap(), 0b1010000010);
        assert_eq!(CipherType::SAES.parse_key("0xA73B").unwrap(), 0xa73b);
        assert_eq!(CipherType::SAES.parse_key("a73b").unwrap(), 0xa73b);
        assert!(CipherType::SDES.parse_key("1012").is_err());
        assert!(CipherType::SAES.parse_key("0x").is_err());
    }

    #[test]
    fn iv_decimal_or_hex() {
        assert_eq!(parse_iv("100").unwrap(), 100);
        assert_eq!(parse_iv("0xff").unwrap(), 0xff);
        assert!(parse_iv("ff").is_err());
        assert!(parse_iv("-1").is_err());
    }

    #[test]
    fn direction_rules() {
        assert_eq!(direction(Mode::ECB, true, false).unwrap(), Direction::Encrypt);
        assert_eq!(direction(Mode::CBC, false, true).unwrap(), Direction::Decrypt);
        assert_eq!(direction(Mode::CTR, false, false).unwrap(), Direction::Encrypt);
        assert!(matches!(
            direction(Mode::CBC, false, false),
            Err(BlockmodeError::MissingDirection(_))
        ));
        assert!(direction(Mode::ECB, true, true).is_err());
    }
}
