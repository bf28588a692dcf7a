#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{BlockError, BlockResult};

mod state;
pub use state::Snapshot;

mod rules;
pub use rules::{calc_difficulty, calc_gaslimit, check_gaslimit, uncle_reward};

mod exec;
pub use exec::{ExecutionOutcome, TransactionExecutor};

mod engine;
pub use engine::Engine;

mod block;
pub use block::Block;

mod cached;
pub use cached::CachedBlock;

mod genesis;
pub use genesis::{genesis, GenesisAccount};

#[cfg(test)]
pub(crate) mod test_utils;
