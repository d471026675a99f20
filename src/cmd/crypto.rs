use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use cipher::block_cipher::{mask, SAES, SDES};
use cipher::{BlockCipher, Direction, Mode, RunConfig, StreamDriver};
use clap::Parser;

use super::args::{direction, parse_iv, CipherType, ModeType};
use super::config::BlockmodeConfig;
use crate::error::BlockmodeError;
use crate::log_error;

#[derive(Parser, Debug)]
#[command(name = "blockmode", version = env!("BLOCKMODE_VERSION_INFO"))]
#[command(about = "Run S-DES/S-AES over files in ECB, CBC or CTR mode, chunk by chunk")]
pub struct CryptoArgs {
    #[arg(help = "the cipher algorithm, one of [sdes, saes]")]
    pub cipher: CipherType,

    #[arg(value_enum, ignore_case = true, help = "the mode of operation")]
    pub mode: ModeType,

    #[arg(short, long, conflicts_with = "decrypt", help = "encrypt the input file")]
    pub encrypt: bool,

    #[arg(short, long, help = "decrypt the input file")]
    pub decrypt: bool,

    #[arg(long = "iv", visible_alias = "nonce", value_parser = parse_iv)]
    #[arg(help = "the IV(CBC) or nonce(CTR), decimal or 0x prefixed hexadecimal")]
    pub iv: Option<u64>,

    #[arg(help = "the cipher key, binary for sdes and hexadecimal for saes")]
    pub key: String,

    #[arg(value_name = "INPUT", help = "the input file path")]
    pub ifile: PathBuf,

    #[arg(value_name = "OUTPUT", help = "the output file path")]
    pub ofile: PathBuf,

    #[arg(short = 's', long = "chunk-size")]
    #[arg(help = "the byte size of chunks to process the file in")]
    pub chunk_size: Option<usize>,

    #[arg(short, long, help = "process chunks with multiple threads, if the mode allows")]
    pub concurrent: bool,

    #[arg(short = 'w', long = "max-workers", help = "the maximum number of worker threads")]
    pub max_workers: Option<usize>,

    #[arg(long, value_name = "PATH", help = "the config file path")]
    pub config: Option<PathBuf>,
}

impl CryptoArgs {
    pub fn exe(self) -> bool {
        log_error(self.run()).is_some()
    }

    pub fn run(self) -> anyhow::Result<()> {
        match self.cipher {
            CipherType::SDES => self.run_with(&SDES),
            CipherType::SAES => self.run_with(&SAES),
        }
    }

    fn run_with<E: BlockCipher + Sync>(self, cipher: &E) -> anyhow::Result<()> {
        let cfg = BlockmodeConfig::config_with_file(self.config.as_deref());
        let config = self.run_config::<E>(cfg)?;
        let direction = config.direction;

        let mut driver = StreamDriver::new(cipher, config)?;

        let ifile = File::open(&self.ifile)
            .with_context(|| format!("open input file `{}` failed", self.ifile.display()))?;
        let ofile = File::create(&self.ofile)
            .with_context(|| format!("create output file `{}` failed", self.ofile.display()))?;

        let mut writer = BufWriter::new(ofile);
        let report = driver.run(BufReader::new(ifile), &mut writer)?;

        log::info!(
            "SUCCESS({}) {}, {} bytes",
            direction,
            self.ofile.display(),
            report.written
        );
        Ok(())
    }

    fn run_config<E: BlockCipher>(&self, cfg: &BlockmodeConfig) -> anyhow::Result<RunConfig> {
        let mode = Mode::from(self.mode);
        let direction = direction(mode, self.encrypt, self.decrypt)?;
        let key = self.cipher.parse_key(&self.key)?;

        let iv = match (mode, direction, self.iv) {
            (Mode::ECB, _, iv) => iv,
            (_, _, Some(iv)) => Some(iv),
            (Mode::CBC, Direction::Decrypt, None) => {
                return Err(BlockmodeError::MissingIv(mode.to_string()).into());
            }
            (_, _, None) => {
                let iv = rand::random::<u64>() & mask(E::BLOCK_BITS);
                log::info!("IV/nonce generated is {iv} ({iv:#x})");
                Some(iv)
            }
        };

        let max_workers = self.max_workers.map_or(cfg.threads, |w| w.min(cfg.threads));

        Ok(RunConfig::new(mode, direction, key)
            .iv(iv)
            .chunk_size(self.chunk_size.unwrap_or(cfg.chunk_size))
            .concurrent(self.concurrent)
            .max_workers(Some(max_workers))
            .inflight_per_worker(cfg.inflight_per_worker))
    }
}
