pub mod cli;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod evm;
pub mod fuzz;
pub mod logging;
pub mod mr;
pub mod report;
pub mod substate;

use std::sync::Arc;

use cli::ReplaySiArgs;
use context::Context;
use dispatch::Dispatcher;
use evm::InMemoryEvmKernel;
use fuzz::encoder::AlloyAbiEncoder;
use mr::{Driver, EnvDriver, HookDriver, ManiDriver, TodDriver};
use substate::JsonSubstateProvider;

/// Wires the context, collaborators and enabled relation drivers together
/// and runs the dispatcher over the requested block range.
pub fn run(args: ReplaySiArgs) -> eyre::Result<()> {
    args.validate()?;

    let ctx = Arc::new(Context::bootstrap(&args.dapp_dir)?);

    let rich_info_blocks = if args.rich_info {
        let blocks = ctx.rich_info_blocks()?;
        let provider: JsonSubstateProvider = JsonSubstateProvider::new(&args.substate_dir);
        mr::rich_info::harvest_calldata_seeds(&ctx, &provider, &blocks);
        blocks
    } else {
        Vec::new()
    };

    let provider: Arc<dyn substate::SubstateProvider> =
        Arc::new(JsonSubstateProvider::new(&args.substate_dir));
    let kernel: Arc<dyn evm::EvmKernel> = Arc::new(InMemoryEvmKernel::default());
    let encoder: Arc<dyn fuzz::encoder::AbiEncoder> = Arc::new(AlloyAbiEncoder);

    let mut drivers: Vec<Box<dyn Driver>> = Vec::new();
    if !args.skip_env {
        drivers.push(Box::new(EnvDriver));
    }
    if !args.skip_tod {
        drivers.push(Box::new(TodDriver));
    }
    if !args.skip_mani {
        drivers.push(Box::new(ManiDriver));
    }
    if !args.skip_hook {
        drivers.push(Box::new(HookDriver));
    }
    let drivers = Arc::new(drivers);

    let dispatcher = Dispatcher::new(args.workers, args.rich_info, rich_info_blocks);
    dispatcher.run(ctx, provider, kernel, encoder, drivers, args.block_first, args.block_last)?;

    Ok(())
}
