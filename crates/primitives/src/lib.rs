#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{HeaderError, ReceiptError};

pub mod codec;
pub mod constants;

mod bloom;
pub use bloom::{bloom_from_list, bloom_insert, bloomables, logs_bloom};

mod account;
pub use account::Account;

mod receipt;
pub use receipt::Receipt;

mod header;
pub use header::BlockHeader;

mod pow;
pub use pow::{Ethash, EthashCacheLru, PowOutput};

pub use alloy_primitives::Log;
