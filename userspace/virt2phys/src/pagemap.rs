// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Pagemap entry layout and positioned reads
//!
//! Each virtual page owns one 64-bit entry at `page_index * ENTRY_SIZE`.
//! Bits 0-54 hold the page frame number; the high bits are status flags
//! (see Documentation/admin-guide/mm/pagemap.rst). Unprivileged readers get
//! entries with the PFN field zeroed.

use std::fs::File;
use std::io;
use std::os::unix::fs::FileExt;

/// Size in bytes of one pagemap entry.
pub const ENTRY_SIZE: usize = 8;

/// Smallest base page size accepted for indexing (Linux never goes below 4 KiB).
pub const MIN_PAGE_SIZE: u64 = 4096;

/// Mask selecting the page frame number bits (0-54).
pub const PFN_MASK: u64 = 0x007f_ffff_ffff_ffff;

const SWAPPED_BIT: u64 = 1 << 62;
const PRESENT_BIT: u64 = 1 << 63;

/// One decoded pagemap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagemapEntry(u64);

impl PagemapEntry {
    /// Wraps a raw 64-bit entry.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Decodes an entry as the kernel writes it (native endian).
    pub fn from_bytes(bytes: [u8; ENTRY_SIZE]) -> Self {
        Self(u64::from_ne_bytes(bytes))
    }

    /// Raw entry including flag bits.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Page frame number; zero when the page has no frame.
    pub const fn pfn(self) -> u64 {
        self.0 & PFN_MASK
    }

    /// Bit 63.
    pub const fn is_present(self) -> bool {
        self.0 & PRESENT_BIT != 0
    }

    /// Bit 62.
    pub const fn is_swapped(self) -> bool {
        self.0 & SWAPPED_BIT != 0
    }
}

/// Byte-addressable source supporting positioned reads.
///
/// Implemented for [`File`] (pread); tests supply in-memory sources to
/// inject short reads and I/O errors.
pub trait PagemapSource {
    /// Reads up to `buf.len()` bytes at `offset` without moving any cursor.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

impl PagemapSource for File {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        FileExt::read_at(self, buf, offset)
    }
}

impl<S: PagemapSource + ?Sized> PagemapSource for &S {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        (**self).read_at(buf, offset)
    }
}

/// Byte offset of the entry describing `virt_addr`; `None` if it does not
/// fit in 64 bits.
pub fn entry_offset(virt_addr: u64, page_size: u64) -> Option<u64> {
    (virt_addr / page_size).checked_mul(ENTRY_SIZE as u64)
}
