//! Rich-info merging: when enabled, prior-block output allocations,
//! restricted to inner addresses, are merged into the current substate;
//! prior-block calldata seeds the corpus at startup.

use crate::context::Context;
use crate::substate::SubstateProvider;

use super::preprocess::PreparedSubstate;

/// Merges `output_alloc` entries from every substate of `prior_block`
/// (restricted to `inner_set`) into both the input and output alloc of
/// `prepared`, in place.
pub fn apply(prepared: &mut PreparedSubstate, provider: &dyn SubstateProvider, prior_block: u64) {
    let inner_set = prepared.inner_set.clone();
    for (_, prior_substate) in provider.get_block_substates(prior_block) {
        for (addr, account) in prior_substate.output_alloc {
            if !inner_set.contains(&addr) {
                continue;
            }
            prepared.substate.input_alloc.entry(addr).or_insert_with(|| account.clone());
            prepared.substate.output_alloc.entry(addr).or_insert(account);
        }
    }
}

/// Harvests calldata from prior blocks into the seed pools at startup, one
/// pass over every block named in `blockInfo.txt`.
pub fn harvest_calldata_seeds(ctx: &Context, provider: &dyn SubstateProvider, blocks: &[u64]) {
    for &block in blocks {
        for (_, substate) in provider.get_block_substates(block) {
            if !substate.message.data.is_empty() {
                ctx.seeds.bytes_seed.push(format!("0x{}", hex::encode(&substate.message.data)), block);
            }
        }
    }
}
