//! Parallel block-processing dispatcher: N worker threads, one producer,
//! bounded channels, out-of-order completion with in-order progress
//! reporting, and a final aggregate-statistics summary at shutdown.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select};

use crate::context::Context;
use crate::error::{DispatchError, MrError};
use crate::evm::EvmKernel;
use crate::fuzz::encoder::AbiEncoder;
use crate::mr::{preprocess, rich_info, Driver};
use crate::report;
use crate::substate::{is_pure_transfer, SubstateProvider};

pub struct Dispatcher {
    pub workers: usize,
    pub rich_info: bool,
    pub rich_info_blocks: Arc<Vec<u64>>,
}

enum DoneMsg {
    Completed { block: u64, tx_count: usize },
    Failed { block: u64, error: DispatchError },
}

/// The cadence table: at block multiples of `decade`, report progress if
/// at least `min_interval` has elapsed since the previous report for that
/// decade. Smaller decades report more often.
const CADENCE: &[(u64, Duration)] = &[
    (10, Duration::from_secs(40)),
    (100, Duration::from_secs(20)),
    (1_000, Duration::from_secs(10)),
    (10_000, Duration::from_secs(5)),
];

impl Dispatcher {
    pub fn new(workers: usize, rich_info: bool, rich_info_blocks: Vec<u64>) -> Self {
        Self { workers: workers.max(1), rich_info, rich_info_blocks: Arc::new(rich_info_blocks) }
    }

    pub fn run(
        &self,
        ctx: Arc<Context>,
        provider: Arc<dyn SubstateProvider>,
        kernel: Arc<dyn EvmKernel>,
        encoder: Arc<dyn AbiEncoder>,
        drivers: Arc<Vec<Box<dyn Driver>>>,
        first: u64,
        last: u64,
    ) -> Result<(), DispatchError> {
        let (work_tx, work_rx) = bounded::<u64>(self.workers * 10);
        let (done_tx, done_rx) = bounded::<DoneMsg>(self.workers * 10);
        let (stop_tx, stop_rx) = bounded::<()>(self.workers + 1);

        let producer = {
            let work_tx = work_tx.clone();
            let stop_rx = stop_rx.clone();
            std::thread::spawn(move || {
                for block in first..=last {
                    select! {
                        send(work_tx, block) -> res => {
                            if res.is_err() {
                                break;
                            }
                        }
                        recv(stop_rx) -> _ => break,
                    }
                }
            })
        };

        let mut handles = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let work_rx = work_rx.clone();
            let done_tx = done_tx.clone();
            let stop_rx = stop_rx.clone();
            let ctx = ctx.clone();
            let provider = provider.clone();
            let kernel = kernel.clone();
            let encoder = encoder.clone();
            let drivers = drivers.clone();
            let rich_info_blocks = if self.rich_info { self.rich_info_blocks.clone() } else { Arc::new(Vec::new()) };

            handles.push(std::thread::spawn(move || loop {
                select! {
                    recv(work_rx) -> msg => {
                        match msg {
                            Ok(block) => {
                                let outcome = execute_block(
                                    &ctx,
                                    provider.as_ref(),
                                    kernel.as_ref(),
                                    encoder.as_ref(),
                                    &drivers,
                                    block,
                                    &rich_info_blocks,
                                );
                                let done = match outcome {
                                    Ok(tx_count) => DoneMsg::Completed { block, tx_count },
                                    Err(error) => DoneMsg::Failed { block, error },
                                };
                                if done_tx.send(done).is_err() {
                                    break;
                                }
                            }
                            Err(_) => break,
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            }));
        }
        drop(work_tx);
        drop(work_rx);
        drop(done_tx);

        let start = Instant::now();
        let mut last_report: Vec<Instant> = CADENCE.iter().map(|_| start).collect();
        let mut waiting: BTreeSet<u64> = BTreeSet::new();
        let mut next_expected = first;
        let mut total_tx: u64 = 0;
        let mut total_blocks: u64 = 0;
        let mut dispatch_error = None;

        while next_expected <= last {
            let Ok(msg) = done_rx.recv() else { break };
            match msg {
                DoneMsg::Completed { block, tx_count } => {
                    total_tx += tx_count as u64;
                    waiting.insert(block);
                }
                DoneMsg::Failed { error, .. } => {
                    dispatch_error = Some(error);
                    break;
                }
            }

            while waiting.contains(&next_expected) {
                waiting.remove(&next_expected);
                total_blocks += 1;
                maybe_report_progress(next_expected, last, start, &mut last_report, total_blocks, total_tx);
                next_expected += 1;
            }
        }

        for _ in 0..self.workers + 1 {
            let _ = stop_tx.send(());
        }
        let _ = producer.join();
        for handle in handles {
            let _ = handle.join();
        }

        let elapsed = start.elapsed();
        tracing::info!(
            total_blocks,
            total_tx,
            blocks_per_sec = total_blocks as f64 / elapsed.as_secs_f64().max(1e-9),
            tx_per_sec = total_tx as f64 / elapsed.as_secs_f64().max(1e-9),
            elapsed_secs = elapsed.as_secs_f64(),
            "dispatch run complete"
        );

        match dispatch_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn maybe_report_progress(
    block: u64,
    last: u64,
    start: Instant,
    last_report: &mut [Instant],
    total_blocks: u64,
    total_tx: u64,
) {
    let now = Instant::now();
    for (i, (decade, min_interval)) in CADENCE.iter().enumerate() {
        if block % decade == 0 || block == last {
            if now.duration_since(last_report[i]) >= *min_interval || block == last {
                last_report[i] = now;
                let elapsed = now.duration_since(start).as_secs_f64().max(1e-9);
                tracing::info!(
                    block,
                    total_blocks,
                    total_tx,
                    blocks_per_sec = total_blocks as f64 / elapsed,
                    tx_per_sec = total_tx as f64 / elapsed,
                    "progress"
                );
                break;
            }
        }
    }
}

/// Executes every substate of `block` in transaction order, skipping pure
/// transfers and CREATE transactions. Returns the number of transactions
/// actually dispatched to a driver.
pub fn execute_block(
    ctx: &Context,
    provider: &dyn SubstateProvider,
    kernel: &dyn EvmKernel,
    encoder: &dyn AbiEncoder,
    drivers: &[Box<dyn Driver>],
    block: u64,
    rich_info_blocks: &[u64],
) -> Result<usize, DispatchError> {
    let mut tx_count = 0;

    for (_, substate) in provider.get_block_substates(block) {
        let Some(to) = substate.message.to else {
            continue; // CREATE transaction
        };
        if is_pure_transfer(&substate.input_alloc, &to) {
            continue;
        }

        let mut prepared = match preprocess::preprocess(ctx, &substate, block) {
            Ok(prepared) => prepared,
            Err(MrError::NotInner) => continue,
            Err(other) => {
                log_or_swallow(ctx, &other)?;
                continue;
            }
        };

        for &prior_block in rich_info_blocks.iter().filter(|&&b| b < block) {
            rich_info::apply(&mut prepared, provider, prior_block);
        }

        for driver in drivers {
            match driver.run(ctx, kernel, encoder, block, &prepared) {
                Ok(Some(bug)) => report::write_bug(ctx, &bug).map_err(DispatchError::Io)?,
                Ok(None) => {}
                Err(err) => log_or_swallow(ctx, &err)?,
            }
        }

        tx_count += 1;
    }

    Ok(tx_count)
}

fn log_or_swallow(ctx: &Context, err: &MrError) -> Result<(), DispatchError> {
    if err.is_expected_evm_outcome() {
        return Ok(());
    }
    report::log_error(ctx, &err.to_string()).map_err(DispatchError::Io)
}
