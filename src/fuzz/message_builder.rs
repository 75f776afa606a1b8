//! Message builder: synthesizes calldata candidates for every
//! state-mutating function of every targeted contract.

use std::collections::HashMap;

use crate::context::{Context, FuzzCtx};
use crate::fuzz::abi::Abi;
use crate::fuzz::encoder::AbiEncoder;
use crate::fuzz::types::Type;
use crate::fuzz::value::{fuzz, Value};

/// Fuzz fan-out per function.
pub const RAND_CASE_SCALE: usize = 10;

/// Sentinel recorded in place of a candidate the fuzzer failed to produce,
/// preserving index alignment across the three output arrays.
pub const SENTINEL: &str = "0xcaffee";

#[derive(Debug, Default)]
pub struct BuildOutput {
    pub addrs: Vec<String>,
    pub hex_msgs: Vec<String>,
    pub stringified_msgs: Vec<String>,
}

impl BuildOutput {
    fn push(&mut self, addr: &str, hex_msg: impl Into<String>, stringified: impl Into<String>) {
        self.addrs.push(addr.to_string());
        self.hex_msgs.push(hex_msg.into());
        self.stringified_msgs.push(stringified.into());
    }

    fn push_sentinel(&mut self, addr: &str) {
        self.push(addr, SENTINEL, SENTINEL);
    }
}

fn one_candidate(
    ctx: &Context,
    encoder: &dyn AbiEncoder,
    fuzz_ctx: &FuzzCtx,
    target: &str,
    signature: &str,
    arg_types: &[String],
    out: &mut BuildOutput,
) {
    if arg_types.is_empty() {
        match encoder.encode_call(signature, &[], &[]) {
            Ok(hex) => out.push(target, hex, signature.to_string()),
            Err(_) => out.push_sentinel(target),
        }
        return;
    }

    let fuzzed: Result<Vec<Value>, _> = arg_types
        .iter()
        .map(|ty_str| {
            let ty = Type::parse(ty_str)?;
            let values = fuzz(&ty, &ctx.seeds, fuzz_ctx)?;
            Ok::<_, crate::error::FuzzError>(values.into_iter().next().expect("fuzz returns a singleton"))
        })
        .collect();

    let Ok(values) = fuzzed else {
        out.push_sentinel(target);
        return;
    };

    let joined = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
    let stringified = format!("{signature}:[{joined}]");

    match encoder.encode_call(signature, arg_types, &values) {
        Ok(hex) => out.push(target, hex, stringified),
        Err(_) => out.push_sentinel(target),
    }
}

/// `build(targets, timestamp, local_users, local_contracts)`: for every
/// state-mutating function of every target contract, generates
/// `RAND_CASE_SCALE` candidate calldata strings. A function with no inputs
/// contributes exactly one candidate (the inner loop breaks immediately
/// after the first successful bare-signature encode).
pub fn build(
    ctx: &Context,
    encoder: &dyn AbiEncoder,
    targets: &[String],
    timestamp: u64,
    local_users: &[String],
    local_contracts: &[String],
) -> BuildOutput {
    let mut out = BuildOutput::default();
    let fuzz_ctx = FuzzCtx {
        current_block: timestamp,
        local_users: local_users.to_vec(),
        local_contracts: local_contracts.to_vec(),
    };

    for target in targets {
        let path = ctx.abi_path_for(target);
        let Ok(data) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(abi) = Abi::from_json(&data) else {
            continue;
        };

        for f in abi.state_mutating_functions() {
            let signature = f.signature();
            let arg_types: Vec<String> = f.inputs.iter().map(|e| e.ty.clone()).collect();

            if arg_types.is_empty() {
                one_candidate(ctx, encoder, &fuzz_ctx, target, &signature, &arg_types, &mut out);
                continue;
            }

            for _ in 0..RAND_CASE_SCALE {
                one_candidate(ctx, encoder, &fuzz_ctx, target, &signature, &arg_types, &mut out);
            }
        }
    }

    out
}

/// The second-form builder: restricted to a provided `{contract ->
/// [signatures]}` map. After emitting one function's candidates it advances
/// to the next contract — this asymmetric "one function per contract"
/// behavior is preserved unchanged; see DESIGN.md's Open Question log.
pub fn build_restricted(
    ctx: &Context,
    encoder: &dyn AbiEncoder,
    targets: &HashMap<String, Vec<String>>,
    timestamp: u64,
    local_users: &[String],
    local_contracts: &[String],
) -> BuildOutput {
    let mut out = BuildOutput::default();
    let fuzz_ctx = FuzzCtx {
        current_block: timestamp,
        local_users: local_users.to_vec(),
        local_contracts: local_contracts.to_vec(),
    };

    for (target, signatures) in targets {
        let path = ctx.abi_path_for(target);
        let Ok(data) = std::fs::read_to_string(&path) else {
            continue;
        };
        let Ok(abi) = Abi::from_json(&data) else {
            continue;
        };

        for f in abi.state_mutating_functions() {
            let signature = f.signature();
            if !signatures.iter().any(|s| s == &signature) {
                continue;
            }

            let arg_types: Vec<String> = f.inputs.iter().map(|e| e.ty.clone()).collect();
            if arg_types.is_empty() {
                one_candidate(ctx, encoder, &fuzz_ctx, target, &signature, &arg_types, &mut out);
            } else {
                for _ in 0..RAND_CASE_SCALE {
                    one_candidate(ctx, encoder, &fuzz_ctx, target, &signature, &arg_types, &mut out);
                }
            }
            break;
        }
    }

    out
}

/// The full Cartesian product of per-parameter candidates (no caller in
/// the core today — the "argument construction rule" used by
/// `build`/`build_restricted` only needs the first candidate of each
/// parameter). Candidate lists for parameter indices beyond the third are
/// sampled down to 2 entries when they hold more than 2 candidates, to
/// bound the combinatorial blowup.
pub fn values(per_param_candidates: &[Vec<Value>]) -> Vec<Vec<Value>> {
    let capped: Vec<Vec<Value>> = per_param_candidates
        .iter()
        .enumerate()
        .map(|(idx, candidates)| {
            if idx > 3 && candidates.len() > 2 {
                candidates[..2].to_vec()
            } else {
                candidates.clone()
            }
        })
        .collect();

    let mut product = vec![Vec::new()];
    for candidates in &capped {
        let mut next = Vec::with_capacity(product.len() * candidates.len().max(1));
        for prefix in &product {
            for candidate in candidates {
                let mut row = prefix.clone();
                row.push(candidate.clone());
                next.push(row);
            }
        }
        product = next;
    }
    product
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzz::encoder::AlloyAbiEncoder;
    use tempfile::tempdir;

    fn write_abi(dir: &std::path::Path, addr: &str, json: &str) {
        std::fs::create_dir_all(dir.join("abi")).unwrap();
        std::fs::write(dir.join("abi").join(format!("{addr}.json")), json).unwrap();
    }

    #[test]
    fn build_keeps_arrays_equal_length() {
        let dir = tempdir().unwrap();
        write_abi(
            dir.path(),
            "0xabc",
            r#"[{"name":"transfer","type":"function","inputs":[{"name":"to","type":"address"},{"name":"v","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable","constant":false}]"#,
        );
        let ctx = Context::bootstrap(dir.path()).unwrap();
        let encoder = AlloyAbiEncoder;
        let out = build(&ctx, &encoder, &["0xabc".to_string()], 1, &[], &[]);

        assert_eq!(out.addrs.len(), out.hex_msgs.len());
        assert_eq!(out.addrs.len(), out.stringified_msgs.len());
        assert_eq!(out.addrs.len(), RAND_CASE_SCALE);
    }

    #[test]
    fn unreadable_abi_skips_the_contract() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("abi")).unwrap();
        let ctx = Context::bootstrap(dir.path()).unwrap();
        let encoder = AlloyAbiEncoder;
        let out = build(&ctx, &encoder, &["0xmissing".to_string()], 1, &[], &[]);
        assert!(out.addrs.is_empty());
    }

    #[test]
    fn values_caps_high_index_candidates_at_two() {
        let many: Vec<Value> = (0..5).map(|i| Value::Bool(i % 2 == 0)).collect();
        let params = vec![vec![Value::Bool(true)], vec![Value::Bool(true)], vec![Value::Bool(true)], vec![
            Value::Bool(true),
        ], many];
        let product = values(&params);
        // last parameter capped to 2 candidates, so product size is 2.
        assert_eq!(product.len(), 2);
    }
}
