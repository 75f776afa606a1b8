//! The ABI-aware message fuzzer: random selection, seed pools, the type
//! registry, per-type value generation, ABI loading, calldata encoding and
//! the message builder.

pub mod abi;
pub mod encoder;
pub mod message_builder;
pub mod random;
pub mod seed;
pub mod types;
pub mod value;
