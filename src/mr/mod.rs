//! Metamorphic replay engine: the four relation drivers, inner-restricted
//! state equality, substate pre-processing, and rich-info merging.

pub mod env;
pub mod hook;
pub mod mani;
pub mod preprocess;
pub mod rich_info;
pub mod state_eq;
pub mod tod;

use crate::context::Context;
use crate::error::MrError;
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::report::BugRecord;

/// One metamorphic relation, orchestrating paired executions and reporting
/// a bug record on divergence. `Ok(None)` means the relation ran and found
/// no divergence (or determined the substate was not "inner" and was
/// skipped, in which case `MrError::NotInner` is returned instead — see
/// `preprocess::classify`).
pub trait Driver: Send + Sync {
    fn run(
        &self,
        ctx: &Context,
        kernel: &dyn EvmKernel,
        encoder: &dyn AbiEncoder,
        block: u64,
        substate: &preprocess::PreparedSubstate,
    ) -> Result<Option<BugRecord>, MrError>;
}

pub use env::EnvDriver;
pub use hook::HookDriver;
pub use mani::ManiDriver;
pub use tod::TodDriver;

use std::str::FromStr;

use alloy_primitives::Address;

use crate::fuzz::message_builder::{self, SENTINEL};

/// Runs the message builder against `targets` and returns `(target,
/// calldata)` pairs for every candidate that wasn't a sentinel fallback.
/// Shared by the TOD and MANI drivers, which differ only in their target
/// set and `from`-selection rule.
pub(crate) fn candidate_messages(
    ctx: &Context,
    encoder: &dyn AbiEncoder,
    targets: &[String],
    block: u64,
    local_users: &[String],
    local_contracts: &[String],
) -> Vec<(Address, Vec<u8>)> {
    let out = message_builder::build(ctx, encoder, targets, block, local_users, local_contracts);

    out.addrs
        .iter()
        .zip(out.hex_msgs.iter())
        .filter(|(_, hex_msg)| hex_msg.as_str() != SENTINEL)
        .filter_map(|(addr, hex_msg)| {
            let addr = Address::from_str(addr).ok()?;
            let data = hex::decode(hex_msg.trim_start_matches("0x")).ok()?;
            Some((addr, data))
        })
        .collect()
}
