#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod errors;
pub use errors::{TrieError, TrieResult};

mod kv;
pub use kv::{Db, KeyValueStore, MemoryDb};

mod trie;
pub use trie::{SecureTrie, Trie, EMPTY_ROOT_HASH};
