//! The process-wide `Context`: seed pools, the ABI directory, and the DApp
//! directory, constructed once in `main` and passed by reference to every
//! driver instead of living behind a global singleton.

use std::path::PathBuf;

use crate::fuzz::seed::{SeedPool, ALWAYS_VISIBLE};
use crate::substate::read_lines;

/// The eight process-wide seed pools named in the data model.
#[derive(Clone, Default)]
pub struct SeedPools {
    pub user_seed: SeedPool,
    pub inner_seed: SeedPool,
    pub outer_seed: SeedPool,
    pub int_seed: SeedPool,
    pub uint_seed: SeedPool,
    pub string_seed: SeedPool,
    pub byte_seed: SeedPool,
    pub bytes_seed: SeedPool,
}

impl SeedPools {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Per-invocation configuration and shared, append-only state.
pub struct Context {
    pub seeds: SeedPools,
    pub abi_dir: PathBuf,
    pub dapp_dir: PathBuf,
}

impl Context {
    /// Loads `address.txt` (inner-contract addresses, seeded so they are
    /// always visible) and, if present, harvests `blockInfo.txt` block
    /// numbers for rich-info mode.
    pub fn bootstrap(dapp_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dapp_dir = dapp_dir.into();
        let seeds = SeedPools::new();

        let address_file = dapp_dir.join("address.txt");
        if address_file.exists() {
            for line in read_lines(&address_file)? {
                seeds.inner_seed.push(line.to_lowercase(), ALWAYS_VISIBLE);
            }
        }

        Ok(Self { seeds, abi_dir: dapp_dir.join("abi"), dapp_dir })
    }

    pub fn rich_info_blocks(&self) -> std::io::Result<Vec<u64>> {
        let path = self.dapp_dir.join("blockInfo.txt");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(read_lines(&path)?
            .into_iter()
            .filter_map(|l| l.parse::<u64>().ok())
            .collect())
    }

    /// Path to the ABI JSON for a target named by its lowercase `0x`-prefixed
    /// address string, e.g. as read from `address.txt` or a substate.
    pub fn abi_path_for(&self, addr: &str) -> PathBuf {
        self.abi_dir.join(format!("{addr}.json"))
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.dapp_dir.join("errorLog.txt")
    }

    pub fn bug_log_path(&self) -> PathBuf {
        self.dapp_dir.join("SIbugLog.txt")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dapp_dir.join("output")
    }
}

/// Per-task fuzzing context: the block the substate under test belongs to,
/// plus the locally-classified user/contract addresses for that substate.
/// Distinct from `Context`, which is process-wide; this is task-local.
#[derive(Debug, Clone, Default)]
pub struct FuzzCtx {
    pub current_block: u64,
    pub local_users: Vec<String>,
    pub local_contracts: Vec<String>,
}

impl FuzzCtx {
    pub fn new(current_block: u64) -> Self {
        Self { current_block, local_users: Vec::new(), local_contracts: Vec::new() }
    }
}
