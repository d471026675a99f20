use blockmode::cmd::CryptoArgs;
use clap::Parser;
use log::LevelFilter;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    if !CryptoArgs::parse().exe() {
        std::process::exit(1);
    }
}
