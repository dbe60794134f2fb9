// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Translator configuration.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pagemap::MIN_PAGE_SIZE;

/// Per-process pagemap export on Linux.
pub const DEFAULT_PAGEMAP_PATH: &str = "/proc/self/pagemap";

/// Settings consumed by [`crate::Translator::open_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Pagemap export to open.
    pub pagemap_path: PathBuf,
    /// Page size override; `None` queries the host.
    pub page_size: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self { pagemap_path: PathBuf::from(DEFAULT_PAGEMAP_PATH), page_size: None }
    }
}

impl Config {
    /// Replaces the pagemap path.
    pub fn with_pagemap_path(mut self, path: impl AsRef<Path>) -> Self {
        self.pagemap_path = path.as_ref().to_path_buf();
        self
    }

    /// Pins the page size instead of querying the host.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Rejects settings that would break page indexing.
    pub fn validate(&self) -> Result<()> {
        if self.pagemap_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("empty pagemap path".into()));
        }
        match self.page_size {
            Some(size) => check_page_size(size),
            None => Ok(()),
        }
    }
}

/// Accepts power-of-two page sizes of at least [`MIN_PAGE_SIZE`].
pub(crate) fn check_page_size(size: u64) -> Result<()> {
    if !size.is_power_of_two() {
        return Err(Error::InvalidConfig(format!("page size {size} is not a power of two")));
    }
    if size < MIN_PAGE_SIZE {
        return Err(Error::InvalidConfig(format!(
            "page size {size} is below the {MIN_PAGE_SIZE}-byte minimum"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_self_pagemap() {
        let config = Config::default();
        assert_eq!(config.pagemap_path, Path::new("/proc/self/pagemap"));
        assert_eq!(config.page_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_page_size() {
        assert!(Config::default().with_page_size(0).validate().is_err());
        assert!(Config::default().with_page_size(3000).validate().is_err());
        assert!(Config::default().with_page_size(1).validate().is_err());
        assert!(Config::default().with_page_size(2048).validate().is_err());
        assert!(Config::default().with_page_size(4096).validate().is_ok());
        assert!(Config::default().with_page_size(16384).validate().is_ok());
    }

    #[test]
    fn rejects_empty_path() {
        let err = Config::default().with_pagemap_path("").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
