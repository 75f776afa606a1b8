//! Core data model: addresses, allocations, accounts, block environments,
//! messages and substates, plus the `SubstateProvider` trait for the
//! external substate database.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Render an address the way the substate DB and seed pools expect:
/// lowercase, `0x`-prefixed hex.
pub fn addr_lower(addr: &Address) -> String {
    format!("{addr:#x}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    #[serde(default)]
    pub code: Option<Bytes>,
    #[serde(default)]
    pub storage: HashMap<B256, B256>,
}

impl Account {
    pub fn has_code(&self) -> bool {
        self.code.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A snapshot of EVM accounts, keyed by address.
pub type Alloc = HashMap<Address, Account>;

/// Deep-copy an alloc. Structural clone semantics before each replay
/// branch; never alias the original substate's map.
pub fn clone_alloc(alloc: &Alloc) -> Alloc {
    alloc.clone()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Env {
    pub coinbase: Address,
    pub difficulty: U256,
    pub gas_limit: u64,
    pub number: u64,
    pub timestamp: u64,
    #[serde(default)]
    pub block_hashes: HashMap<u64, B256>,
    #[serde(default)]
    pub base_fee: Option<U256>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: u64,
    pub value: U256,
    pub gas: u64,
    pub gas_price: U256,
    #[serde(default)]
    pub gas_fee_cap: Option<U256>,
    #[serde(default)]
    pub gas_tip_cap: Option<U256>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Substate {
    pub input_alloc: Alloc,
    pub output_alloc: Alloc,
    pub env: Env,
    pub message: Message,
}

/// The read-only substate database: `block -> tx_index -> Substate`.
/// This is an out-of-scope external collaborator; the trait is the whole
/// contract this crate requires of it.
pub trait SubstateProvider: Send + Sync {
    /// Ordered `(tx_index, substate)` pairs for one block.
    fn get_block_substates(&self, block: u64) -> Vec<(usize, Substate)>;
}

/// A directory-backed substate provider: one JSON file per block, named
/// `<block>.json`, holding a JSON array of substates in transaction order.
pub struct JsonSubstateProvider {
    dir: PathBuf,
}

impl JsonSubstateProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn block_path(&self, block: u64) -> PathBuf {
        self.dir.join(format!("{block}.json"))
    }
}

impl SubstateProvider for JsonSubstateProvider {
    fn get_block_substates(&self, block: u64) -> Vec<(usize, Substate)> {
        let path = self.block_path(block);
        let Ok(data) = fs::read(&path) else {
            return Vec::new();
        };
        let Ok(substates) = serde_json::from_slice::<Vec<Substate>>(&data) else {
            tracing::warn!(?path, "failed to parse substate file, skipping block");
            return Vec::new();
        };
        substates.into_iter().enumerate().collect()
    }
}

/// An in-memory provider used by tests: substates are inserted directly
/// rather than read from disk.
#[derive(Default)]
pub struct MemorySubstateProvider {
    blocks: HashMap<u64, Vec<Substate>>,
}

impl MemorySubstateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_block(&mut self, block: u64, substates: Vec<Substate>) {
        self.blocks.insert(block, substates);
    }
}

impl SubstateProvider for MemorySubstateProvider {
    fn get_block_substates(&self, block: u64) -> Vec<(usize, Substate)> {
        self.blocks
            .get(&block)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .collect()
    }
}

/// Whether `to` names a pure ETH transfer (an account with no code) as
/// opposed to a contract call. Used by the dispatcher to skip transfers.
pub fn is_pure_transfer(alloc: &Alloc, to: &Address) -> bool {
    alloc.get(to).map(|acc| !acc.has_code()).unwrap_or(true)
}

pub fn read_lines(path: &Path) -> std::io::Result<Vec<String>> {
    let data = fs::read_to_string(path)?;
    Ok(data
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
