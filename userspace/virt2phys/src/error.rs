// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for translator setup and per-address translation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used for translator setup.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised while setting up a [`crate::Translator`].
#[derive(Debug, Error)]
pub enum Error {
    /// The pagemap export could not be opened (usually missing privilege).
    #[error("cannot open {}: {source}", path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The host reported a page size that cannot be used for indexing.
    #[error("unusable host page size: {0}")]
    PageSize(i64),
    /// Configuration rejected before any resource was acquired.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Reasons a single translation yields no physical address.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Positioned read of the pagemap entry failed.
    #[error("cannot read pagemap: {0}")]
    Read(#[from] io::Error),
    /// The read returned fewer bytes than one entry.
    #[error("read {read} bytes from pagemap but expected {expected}")]
    ShortRead {
        /// Bytes actually returned.
        read: usize,
        /// Size of one pagemap entry.
        expected: usize,
    },
    /// The entry carries no frame number (not resident, swapped or hidden).
    #[error("page not present")]
    NotPresent,
    /// Entry offset or physical address does not fit in 64 bits.
    #[error("address {virt_addr:#x} overflows u64 during translation")]
    Overflow {
        /// Address being translated.
        virt_addr: u64,
    },
}

impl TranslateError {
    /// Returns true for failures of the read itself, as opposed to a
    /// well-formed entry that has no usable frame.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Read(_) | Self::ShortRead { .. })
    }
}
