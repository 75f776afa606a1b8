//! Command-line argument parsing: a `Parser`-derived top-level struct with
//! a `validate()` method run before dispatch.

use std::path::PathBuf;

use clap::Parser;
use eyre::{eyre, Result};

#[derive(Debug, Parser)]
#[command(name = "replay-si", about = "Metamorphic differential testing for recorded EVM transactions")]
pub struct ReplaySiArgs {
    /// First block in the inclusive range to replay.
    pub block_first: u64,

    /// Last block in the inclusive range to replay.
    pub block_last: u64,

    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    pub workers: usize,

    #[arg(long)]
    pub skip_env: bool,

    #[arg(long)]
    pub skip_tod: bool,

    #[arg(long)]
    pub skip_mani: bool,

    #[arg(long)]
    pub skip_hook: bool,

    /// Merge prior-block alloc and calldata into each substate before
    /// replay.
    #[arg(long)]
    pub rich_info: bool,

    #[arg(long = "substateDir", default_value = "substate.db")]
    pub substate_dir: PathBuf,

    #[arg(long = "dappDir", default_value = "dapp")]
    pub dapp_dir: PathBuf,

    /// Controls the tracing subscriber filter.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl ReplaySiArgs {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_first > self.block_last {
            return Err(eyre!(
                "block_first ({}) must not be greater than block_last ({})",
                self.block_first,
                self.block_last
            ));
        }
        if self.workers == 0 {
            return Err(eyre!("--workers must be at least 1"));
        }
        if !self.dapp_dir.exists() {
            return Err(eyre!("dapp directory {:?} does not exist", self.dapp_dir));
        }
        Ok(())
    }
}
