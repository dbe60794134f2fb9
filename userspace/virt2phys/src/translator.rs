// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Raw virtual-to-physical translation through the pagemap export
//! OWNERS: @runtime
//!
//! PUBLIC API:
//!   - Translate: single-address translation contract (0 = unresolvable)
//!   - Translator::open()/open_with(): acquire the pagemap handle
//!   - Translator::open_or_exit(): process-terminating setup for top-level callers
//!   - Translator::translate()/try_translate()/entry()
//!
//! ERROR CONDITIONS:
//!   - Error::Open: pagemap cannot be opened (typically needs CAP_SYS_ADMIN)
//!   - TranslateError::Read / ShortRead: logged at error level, sentinel 0
//!   - TranslateError::NotPresent: sentinel 0, not logged above trace
//!
//! Every call performs a blocking pread. Keep it off hot paths and go through
//! `HugepageCache` for repeated lookups.

use std::fs::File;

use log::{debug, error, trace};

use crate::config::{check_page_size, Config};
use crate::error::{Error, Result, TranslateError};
use crate::pagemap::{entry_offset, PagemapEntry, PagemapSource, ENTRY_SIZE};

/// Translation of a single virtual address.
pub trait Translate {
    /// Returns the physical address backing `virt_addr`, or `0` when it
    /// cannot be resolved.
    fn translate(&self, virt_addr: u64) -> u64;
}

impl<T: Translate + ?Sized> Translate for &T {
    fn translate(&self, virt_addr: u64) -> u64 {
        (**self).translate(virt_addr)
    }
}

/// Queries the host for its base page size.
pub fn host_page_size() -> Result<u64> {
    // SAFETY: sysconf reads a system constant and has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    match u64::try_from(size) {
        Ok(size) if size.is_power_of_two() => Ok(size),
        _ => Err(Error::PageSize(i64::from(size))),
    }
}

/// Raw translator owning one pagemap handle for its whole lifetime.
///
/// The handle is closed when the translator is dropped.
#[derive(Debug)]
pub struct Translator<S = File> {
    source: S,
    page_size: u64,
}

impl Translator<File> {
    /// Opens `/proc/self/pagemap` using the host page size.
    pub fn open() -> Result<Self> {
        Self::open_with(&Config::default())
    }

    /// Opens the pagemap export described by `config`.
    pub fn open_with(config: &Config) -> Result<Self> {
        config.validate()?;
        let page_size = match config.page_size {
            Some(size) => size,
            None => host_page_size()?,
        };
        let file = File::open(&config.pagemap_path)
            .map_err(|source| Error::Open { path: config.pagemap_path.clone(), source })?;
        debug!("opened {} (page size {page_size})", config.pagemap_path.display());
        Ok(Self { source: file, page_size })
    }

    /// Opens the pagemap export or terminates the process.
    ///
    /// Without the export no DMA address can be produced, so top-level
    /// callers treat a failed open as unrecoverable.
    pub fn open_or_exit(config: &Config) -> Self {
        match Self::open_with(config) {
            Ok(translator) => translator,
            Err(err) => {
                eprintln!("virt2phys: {err}");
                std::process::exit(1);
            }
        }
    }
}

impl<S: PagemapSource> Translator<S> {
    /// Builds a translator over an arbitrary positioned-read source.
    pub fn from_source(source: S, page_size: u64) -> Result<Self> {
        check_page_size(page_size)?;
        Ok(Self { source, page_size })
    }

    /// Bytes per base page used for indexing and in-page offsets.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Reads the pagemap entry describing `virt_addr`.
    pub fn entry(&self, virt_addr: u64) -> core::result::Result<PagemapEntry, TranslateError> {
        let offset = entry_offset(virt_addr, self.page_size)
            .ok_or(TranslateError::Overflow { virt_addr })?;
        let mut buf = [0u8; ENTRY_SIZE];
        let read = self.source.read_at(&mut buf, offset)?;
        if read != ENTRY_SIZE {
            return Err(TranslateError::ShortRead { read, expected: ENTRY_SIZE });
        }
        Ok(PagemapEntry::from_bytes(buf))
    }

    /// Resolves `virt_addr`, reporting why resolution failed.
    pub fn try_translate(&self, virt_addr: u64) -> core::result::Result<u64, TranslateError> {
        let pfn = self.entry(virt_addr)?.pfn();
        if pfn == 0 {
            return Err(TranslateError::NotPresent);
        }
        pfn.checked_mul(self.page_size)
            .and_then(|base| base.checked_add(virt_addr % self.page_size))
            .ok_or(TranslateError::Overflow { virt_addr })
    }

    /// Resolves `virt_addr`, returning `0` on any failure.
    pub fn translate(&self, virt_addr: u64) -> u64 {
        match self.try_translate(virt_addr) {
            Ok(phys) => phys,
            Err(TranslateError::NotPresent) => {
                trace!("{virt_addr:#x}: page not present");
                0
            }
            Err(err) => {
                error!("{virt_addr:#x}: {err}");
                0
            }
        }
    }
}

impl<S: PagemapSource> Translate for Translator<S> {
    fn translate(&self, virt_addr: u64) -> u64 {
        Translator::translate(self, virt_addr)
    }
}
