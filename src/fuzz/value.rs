//! The dynamic value container and per-type fuzz strategies.

use alloy_primitives::{I256, U256};

use crate::context::{FuzzCtx, SeedPools};
use crate::error::FuzzError;
use crate::fuzz::random;
use crate::fuzz::types::Type;

/// A fuzzed argument value. Stringification rule: hex-prefixed signed
/// (`-0x…` for negative), hex-prefixed unsigned, a raw string (quoted
/// unless it already contains a quote), and lists rendered comma-joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int { width: u8, value: I256 },
    Uint { width: u8, value: U256 },
    Hex(Vec<u8>),
    Str(String),
    /// A seeded address value, kept as its original textual representation
    /// rather than decoded to bytes — seed values are not guaranteed to be
    /// well-formed 20-byte addresses, and the literal string is what must
    /// round-trip (see the scenario in spec §8.4).
    Addr(String),
    List(Vec<Value>),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int { value, .. } => {
                if value.is_negative() {
                    write!(f, "-0x{:x}", value.unsigned_abs())
                } else {
                    write!(f, "0x{:x}", value.unsigned_abs())
                }
            }
            Value::Uint { value, .. } => write!(f, "0x{value:x}"),
            Value::Hex(bytes) => write!(f, "0x{}", hex_string(bytes)),
            Value::Addr(s) => write!(f, "{s}"),
            Value::Str(s) => {
                if s.contains('"') {
                    write!(f, "{s}")
                } else {
                    write!(f, "\"{s}\"")
                }
            }
            Value::List(items) => {
                let joined = items.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
                write!(f, "{joined}")
            }
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn mask_uint(value: U256, width: u8) -> U256 {
    if width >= 32 {
        return value;
    }
    let bits = width as usize * 8;
    let mask = (U256::from(1u64) << bits) - U256::from(1u64);
    value & mask
}

fn uint_max(width: u8) -> U256 {
    mask_uint(U256::MAX, width)
}

fn mask_int(value: I256, width: u8) -> I256 {
    if width >= 32 {
        return value;
    }
    let bits = width as usize * 8;
    let modulus = U256::from(1u64) << bits;
    let mask = modulus - U256::from(1u64);
    let raw = value.into_raw() & mask;
    let sign_bit = U256::from(1u64) << (bits - 1);
    let signed_raw = if raw & sign_bit != U256::ZERO { raw | !mask } else { raw };
    I256::from_raw(signed_raw)
}

fn int_max(width: u8) -> I256 {
    if width >= 32 {
        return I256::MAX;
    }
    let bits = width as usize * 8;
    let raw = (U256::from(1u64) << (bits - 1)) - U256::from(1u64);
    I256::from_raw(raw)
}

fn int_min(width: u8) -> I256 {
    if width >= 32 {
        return I256::MIN;
    }
    let bits = width as usize * 8;
    let sign_bit = U256::from(1u64) << (bits - 1);
    let mask = (U256::from(1u64) << bits) - U256::from(1u64);
    I256::from_raw(sign_bit | !mask)
}

fn parse_hex_u256(s: &str) -> Option<U256> {
    U256::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

fn parse_hex_i256(s: &str) -> Option<I256> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = U256::from_str_radix(digits.trim_start_matches("0x"), 16).ok()?;
    let value = I256::from_raw(magnitude);
    Some(if neg { -value } else { value })
}

/// Fuzzes one value of Solidity type `ty`, returning it wrapped in a
/// singleton list so array recursion can treat scalars and arrays
/// uniformly.
pub fn fuzz(ty: &Type, seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Vec<Value>, FuzzError> {
    Ok(vec![fuzz_one(ty, seeds, ctx)?])
}

fn fuzz_one(ty: &Type, seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    match ty {
        Type::Bool => {
            let choice = random::select_bool(&[true, false])?;
            Ok(Value::Bool(choice))
        }
        Type::Uint(width) => fuzz_uint(*width, seeds, ctx),
        Type::Int(width) => fuzz_int(*width, seeds, ctx),
        Type::Bytes(width) => fuzz_bytes_n(*width, seeds, ctx),
        Type::DynBytes => fuzz_bytes_dyn(seeds, ctx),
        Type::String => fuzz_string(seeds, ctx),
        Type::Address => fuzz_address(seeds, ctx),
        Type::FixedArray(elem, size) => {
            let mut items = Vec::with_capacity(*size as usize);
            for _ in 0..*size {
                items.push(fuzz_one(elem, seeds, ctx)?);
            }
            Ok(Value::List(items))
        }
        Type::DynArray(elem) => {
            let n = {
                let mut sel = rand::thread_rng();
                use rand::Rng;
                sel.gen_range(1..=10u32)
            };
            let mut items = Vec::with_capacity(n as usize);
            for _ in 0..n {
                items.push(fuzz_one(elem, seeds, ctx)?);
            }
            Ok(Value::List(items))
        }
    }
}

fn fuzz_uint(width: u8, seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let visible = seeds.uint_seed.visible_at(ctx.current_block);
    let candidates: Vec<U256> = if !visible.is_empty() {
        visible.iter().filter_map(|s| parse_hex_u256(s)).map(|v| mask_uint(v, width)).collect()
    } else {
        let mut pool: Vec<U256> = (1..=width).map(uint_max).collect();
        pool.push(U256::ZERO);
        pool
    };
    let value = random::select_uint(&candidates)?;
    Ok(Value::Uint { width, value })
}

fn fuzz_int(width: u8, seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let visible = seeds.int_seed.visible_at(ctx.current_block);
    let candidates: Vec<I256> = if !visible.is_empty() {
        visible.iter().filter_map(|s| parse_hex_i256(s)).map(|v| mask_int(v, width)).collect()
    } else {
        let mut pool: Vec<I256> = (1..=width).map(int_max).collect();
        pool.push(int_min(1));
        pool
    };
    let value = random::select_int(&candidates)?;
    Ok(Value::Int { width, value })
}

fn fuzz_bytes_n(width: u8, seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let visible = seeds.byte_seed.visible_at(ctx.current_block);
    let candidates: Vec<Vec<u8>> = if !visible.is_empty() {
        visible
            .iter()
            .filter_map(|s| hex::decode(s.trim_start_matches("0x")).ok())
            .map(|bytes| tail_bytes(bytes, width as usize))
            .collect()
    } else {
        let mut pool: Vec<Vec<u8>> = (1..=width).map(|n| vec![0xffu8; n as usize]).collect();
        pool.push(vec![0x00u8]);
        pool
    };
    let value = random::select_byte(&candidates)?;
    Ok(Value::Hex(value))
}

fn fuzz_bytes_dyn(seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let visible = seeds.bytes_seed.visible_at(ctx.current_block);
    let candidates: Vec<Vec<u8>> = if !visible.is_empty() {
        visible.iter().filter_map(|s| hex::decode(s.trim_start_matches("0x")).ok()).collect()
    } else {
        let mut pool: Vec<Vec<u8>> = (1..=32u8).map(|n| vec![0xffu8; n as usize]).collect();
        pool.push(vec![0x00u8]);
        pool
    };
    let value = random::select_bytes(&candidates)?;
    Ok(Value::Hex(value))
}

fn tail_bytes(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    if bytes.len() > width {
        bytes.drain(0..bytes.len() - width);
    }
    bytes
}

fn fuzz_string(seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let visible = seeds.string_seed.visible_at(ctx.current_block);
    let candidates: Vec<String> = if !visible.is_empty() {
        visible
    } else {
        vec!["hello".to_string(), "ethereum".to_string(), "hello, ethereum".to_string()]
    };
    let value = random::select_string(&candidates)?;
    Ok(Value::Str(value))
}

fn fuzz_address(seeds: &SeedPools, ctx: &FuzzCtx) -> Result<Value, FuzzError> {
    let mut candidates: Vec<String> = ctx.local_users.clone();
    candidates.extend(ctx.local_contracts.clone());

    if candidates.is_empty() {
        candidates.extend(seeds.user_seed.visible_at(ctx.current_block));
        candidates.extend(seeds.inner_seed.visible_at(ctx.current_block));
        candidates.extend(seeds.outer_seed.visible_at(ctx.current_block));
    }

    let value = random::select_address(&candidates)?;
    Ok(Value::Addr(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SeedPools;

    #[test]
    fn uint16_fallback_pool_is_bounded() {
        let seeds = SeedPools::new();
        let ctx = FuzzCtx::new(1);
        let value = fuzz_uint(2, &seeds, &ctx).unwrap();
        let Value::Uint { value, .. } = value else { panic!("expected uint") };
        assert!(value == U256::ZERO || value == U256::from(0xffu64) || value == U256::from(0xffffu64));
    }

    #[test]
    fn address_uses_sole_visible_seed() {
        let seeds = SeedPools::new();
        seeds.inner_seed.push("0xabc", 0);
        let ctx = FuzzCtx::new(1);
        let value = fuzz_address(&seeds, &ctx).unwrap();
        assert_eq!(value, Value::Addr("0xabc".to_string()));
    }

    #[test]
    fn bytes_n_truncates_to_last_n_bytes() {
        let seeds = SeedPools::new();
        seeds.byte_seed.push("0xdeadbeef", 0);
        let ctx = FuzzCtx::new(1);
        let value = fuzz_bytes_n(2, &seeds, &ctx).unwrap();
        assert_eq!(value, Value::Hex(vec![0xbe, 0xef]));
    }

    #[test]
    fn mask_idempotence_on_round_tripped_uint() {
        let width = 4u8;
        let original = U256::from(0x1234_5678u64);
        let masked = mask_uint(original, width);
        assert_eq!(mask_uint(masked, width), masked);
    }

    #[test]
    fn display_renders_negative_int_with_minus_prefix() {
        let v = Value::Int { width: 1, value: I256::from(-1i64) };
        assert_eq!(v.to_string(), "-0x1");
    }

    #[test]
    fn display_quotes_strings_without_embedded_quote() {
        assert_eq!(Value::Str("hi".to_string()).to_string(), "\"hi\"");
    }

    #[test]
    fn display_renders_addr_unquoted_and_unmodified() {
        assert_eq!(Value::Addr("0xabc".to_string()).to_string(), "0xabc");
    }
}
