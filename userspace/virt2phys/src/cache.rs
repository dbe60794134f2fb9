// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Hugepage-granular translation cache
//! OWNERS: @runtime
//!
//! DMA buffers are hugepage backed: 2 MiB aligned and physically contiguous
//! across the hugepage. One raw translation per 2 MiB region therefore covers
//! every address inside it, and later lookups are a map lookup plus an add.
//!
//! Caveats:
//!   - Entries are never evicted or invalidated. A region that is remapped
//!     after its first lookup keeps returning the old physical base.
//!   - A failed raw lookup (sentinel 0) is cached too, so the region keeps
//!     failing even if the page becomes resident later. `translate` then
//!     returns the bare in-region offset; use `resolve` to detect this.
//!   - No internal locking. Share through `SharedCache` or keep one cache
//!     per thread.

use std::collections::HashMap;

use log::trace;
use parking_lot::Mutex;

use crate::error::Result;
use crate::translator::{Translate, Translator};

/// Hugepage size assumed for every cached region (2 MiB).
pub const HUGEPAGE_SIZE: u64 = 2 * 1024 * 1024;

/// 2 MiB-aligned base of the region containing `virt_addr`.
pub const fn hugepage_base(virt_addr: u64) -> u64 {
    virt_addr & !(HUGEPAGE_SIZE - 1)
}

/// Offset of `virt_addr` inside its 2 MiB region.
pub const fn hugepage_offset(virt_addr: u64) -> u64 {
    virt_addr & (HUGEPAGE_SIZE - 1)
}

/// Memoizes raw translations per 2 MiB region.
#[derive(Debug)]
pub struct HugepageCache<T = Translator> {
    raw: T,
    bases: HashMap<u64, u64>,
}

impl HugepageCache<Translator> {
    /// Opens `/proc/self/pagemap` and wraps it in an empty cache.
    pub fn open() -> Result<Self> {
        Translator::open().map(Self::new)
    }
}

impl<T: Translate> HugepageCache<T> {
    /// Wraps `raw` with an empty cache.
    pub fn new(raw: T) -> Self {
        Self { raw, bases: HashMap::new() }
    }

    /// Physical address of `virt_addr`, resolving its region on first use.
    ///
    /// Returns `phys_base + offset`, where `phys_base` is `0` for regions
    /// whose raw lookup failed.
    pub fn translate(&mut self, virt_addr: u64) -> u64 {
        self.physical_base(hugepage_base(virt_addr)).wrapping_add(hugepage_offset(virt_addr))
    }

    /// Like [`translate`](Self::translate) but `None` when the region did
    /// not resolve or the address does not fit in 64 bits.
    pub fn resolve(&mut self, virt_addr: u64) -> Option<u64> {
        match self.physical_base(hugepage_base(virt_addr)) {
            0 => None,
            base => base.checked_add(hugepage_offset(virt_addr)),
        }
    }

    fn physical_base(&mut self, base: u64) -> u64 {
        let raw = &self.raw;
        *self.bases.entry(base).or_insert_with(|| {
            let phys = raw.translate(base);
            trace!("hugepage miss {base:#x} -> {phys:#x}");
            phys
        })
    }

    /// Cached physical base for the 2 MiB region containing `virt_addr`, if any.
    pub fn cached_base(&self, virt_addr: u64) -> Option<u64> {
        self.bases.get(&hugepage_base(virt_addr)).copied()
    }

    /// Number of regions resolved so far (including failed ones).
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// True before the first lookup.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Underlying raw translator.
    pub fn translator(&self) -> &T {
        &self.raw
    }

    /// Drops the cache and returns the raw translator.
    pub fn into_inner(self) -> T {
        self.raw
    }
}

/// [`HugepageCache`] behind a mutex, for callers sharing one instance.
#[derive(Debug)]
pub struct SharedCache<T = Translator> {
    inner: Mutex<HugepageCache<T>>,
}

impl<T: Translate> SharedCache<T> {
    /// Wraps `raw` with an empty shared cache.
    pub fn new(raw: T) -> Self {
        Self { inner: Mutex::new(HugepageCache::new(raw)) }
    }

    /// See [`HugepageCache::translate`].
    pub fn translate(&self, virt_addr: u64) -> u64 {
        self.inner.lock().translate(virt_addr)
    }

    /// See [`HugepageCache::resolve`].
    pub fn resolve(&self, virt_addr: u64) -> Option<u64> {
        self.inner.lock().resolve(virt_addr)
    }

    /// Number of cached regions.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// True before the first lookup.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Returns the unshared cache.
    pub fn into_inner(self) -> HugepageCache<T> {
        self.inner.into_inner()
    }
}
