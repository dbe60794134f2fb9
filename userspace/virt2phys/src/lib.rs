// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Virtual-to-physical address translation for DMA buffers
//! OWNERS: @runtime
//! STATUS: Functional (host, Linux)
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module + tests/ (synthetic pagemap, probe exit, live pagemap)
//!
//! PUBLIC API:
//!   - Translator: raw translation through the per-process pagemap export
//!   - HugepageCache: 2 MiB-granular memoization over any `Translate`
//!   - SharedCache: mutex-guarded cache for multi-threaded callers
//!   - PagemapEntry / PagemapSource: entry decoding and positioned reads
//!   - Config, Error, TranslateError
//!
//! DEPENDENCIES:
//!   - libc: host page size (sysconf)
//!   - log: diagnostics for failed reads
//!   - parking_lot::Mutex: SharedCache
//!   - thiserror: error types
//!
//! Notes:
//! - Physical address `0` is the "not resolvable" sentinel on the `translate`
//!   paths. Use `try_translate` / `resolve` for typed results.
//! - Hugepage mappings are assumed immutable for the process lifetime. There
//!   is no invalidation; a remapped region keeps returning its first result.

#![deny(clippy::all, missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod pagemap;
pub mod translator;

pub use cache::{hugepage_base, hugepage_offset, HugepageCache, SharedCache, HUGEPAGE_SIZE};
pub use config::Config;
pub use error::{Error, Result, TranslateError};
pub use pagemap::{PagemapEntry, PagemapSource, ENTRY_SIZE, PFN_MASK};
pub use translator::{host_page_size, Translate, Translator};
