// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-line logic for the `v2p-probe` diagnostic tool.

use std::hint::black_box;

use crate::cache::HugepageCache;
use crate::config::Config;
use crate::translator::Translate;

/// Upper bound on lines printed for one `buffer` probe.
const MAX_BUFFER_LINES: usize = 16;

/// Returns a short usage description.
pub fn help() -> &'static str {
    "v2p-probe resolves physical addresses through the pagemap export.\n\
     Usage: v2p-probe [--pagemap PATH] [--page-size BYTES] <translate ADDR...|buffer BYTES>"
}

/// Probe to run once the translator is open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Translate each address through the raw path and the cache.
    Translate(Vec<u64>),
    /// Allocate and touch a buffer, then translate it page by page.
    Buffer(usize),
    /// Print usage.
    Help,
}

/// Parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Translator settings.
    pub config: Config,
    /// Probe to run.
    pub command: Command,
}

/// Parses `args` (without the program name).
pub fn parse(args: &[&str]) -> Result<Invocation, String> {
    let mut config = Config::default();
    let mut rest = args;
    loop {
        match rest {
            ["--help", ..] | ["-h", ..] => {
                return Ok(Invocation { config, command: Command::Help });
            }
            ["--pagemap", path, tail @ ..] => {
                config = config.with_pagemap_path(path);
                rest = tail;
            }
            ["--page-size", size, tail @ ..] => {
                config = config.with_page_size(parse_number(size)?);
                rest = tail;
            }
            [flag] if flag.starts_with("--") => return Err(format!("missing value for {flag}")),
            _ => break,
        }
    }
    config.validate().map_err(|err| err.to_string())?;

    let command = match rest {
        [] => Command::Help,
        ["translate"] => return Err("missing address".into()),
        ["translate", addrs @ ..] => {
            Command::Translate(addrs.iter().map(|a| parse_number(a)).collect::<Result<_, _>>()?)
        }
        ["buffer", bytes] => {
            let bytes = parse_number(bytes)?;
            let bytes = usize::try_from(bytes).map_err(|_| format!("buffer too large: {bytes}"))?;
            if bytes == 0 {
                return Err("buffer size must be non-zero".into());
            }
            Command::Buffer(bytes)
        }
        ["buffer", ..] => return Err("buffer takes exactly one size".into()),
        [other, ..] => return Err(format!("unknown command {other}")),
    };
    Ok(Invocation { config, command })
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(input: &str) -> Result<u64, String> {
    let trimmed = input.trim().replace('_', "");
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|err| format!("invalid number {input:?}: {err}"))
}

/// Runs `command` against `cache`, returning printable output.
pub fn execute<T: Translate>(
    command: &Command,
    cache: &mut HugepageCache<T>,
    page_size: u64,
) -> String {
    match command {
        Command::Help => help().to_string(),
        Command::Translate(addrs) => addrs
            .iter()
            .map(|&va| {
                let raw = Some(cache.translator().translate(va)).filter(|phys| *phys != 0);
                let cached = cache.resolve(va);
                format!("{va:#x} raw={} cached={}", render(raw), render(cached))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Buffer(bytes) => probe_buffer(*bytes, cache, page_size),
    }
}

fn probe_buffer<T: Translate>(
    bytes: usize,
    cache: &mut HugepageCache<T>,
    page_size: u64,
) -> String {
    let step = usize::try_from(page_size).unwrap_or(usize::MAX).max(1);
    let mut buffer = vec![0u8; bytes];
    // Fault every page in so the pagemap has frames to report.
    for page in buffer.chunks_mut(step) {
        page[0] = 0xa5;
    }
    let buffer = black_box(buffer);

    let start = buffer.as_ptr() as u64;
    let mut lines = vec![format!("buffer {bytes} bytes at {start:#x}")];
    for offset in (0..bytes).step_by(step).take(MAX_BUFFER_LINES) {
        let va = start + offset as u64;
        lines.push(format!("  {va:#x} -> {}", render(cache.resolve(va))));
    }
    lines.join("\n")
}

fn render(phys: Option<u64>) -> String {
    match phys {
        Some(phys) => format!("{phys:#x}"),
        None => "unresolved".to_string(),
    }
}

/// Parses `std::env::args`, opens the translator and prints the probe output.
///
/// Exits the process when the pagemap export cannot be opened.
pub fn run() -> Result<(), String> {
    let owned: Vec<String> = std::env::args().skip(1).collect();
    let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
    let invocation = parse(&refs)?;
    if invocation.command == Command::Help {
        println!("{}", help());
        return Ok(());
    }

    let translator = crate::Translator::open_or_exit(&invocation.config);
    let page_size = translator.page_size();
    let mut cache = HugepageCache::new(translator);
    println!("{}", execute(&invocation.command, &mut cache, page_size));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{hugepage_base, HUGEPAGE_SIZE};

    /// Maps every region to `0x4000_0000 + base`, except region 0.
    struct LinearRaw;

    impl Translate for LinearRaw {
        fn translate(&self, virt_addr: u64) -> u64 {
            if hugepage_base(virt_addr) == 0 {
                0
            } else {
                0x4000_0000 + virt_addr
            }
        }
    }

    #[test]
    fn parses_flags_and_translate() {
        let args = ["--pagemap", "/tmp/pm", "--page-size", "0x4000", "translate", "0x200000", "42"];
        let inv = parse(&args).expect("parse");
        assert_eq!(inv.config.pagemap_path, std::path::Path::new("/tmp/pm"));
        assert_eq!(inv.config.page_size, Some(0x4000));
        assert_eq!(inv.command, Command::Translate(vec![0x200000, 42]));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["translate"]).is_err());
        assert!(parse(&["translate", "zz"]).is_err());
        assert!(parse(&["--page-size", "1000", "buffer", "4096"]).is_err());
        assert!(parse(&["--page-size", "1", "translate", "0xffffffffffffffff"]).is_err());
        assert!(parse(&["buffer", "0"]).is_err());
        assert!(parse(&["--pagemap"]).is_err());
        assert!(parse(&["frobnicate"]).unwrap_err().contains("unknown command"));
    }

    #[test]
    fn empty_and_help_print_usage() {
        assert_eq!(parse(&[]).expect("parse").command, Command::Help);
        // Flags are only recognised before the command.
        assert!(parse(&["translate", "1", "--help"]).is_err());
        assert_eq!(parse(&["--help"]).expect("parse").command, Command::Help);
    }

    #[test]
    fn translate_reports_raw_and_cached() {
        let mut cache = HugepageCache::new(LinearRaw);
        let output = execute(&Command::Translate(vec![0x200010, 0x10]), &mut cache, 4096);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "0x200010 raw=0x40200010 cached=0x40200010");
        assert_eq!(lines[1], "0x10 raw=unresolved cached=unresolved");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn buffer_probe_is_bounded() {
        let mut cache = HugepageCache::new(LinearRaw);
        let bytes = 64 * 4096;
        let output = execute(&Command::Buffer(bytes), &mut cache, 4096);
        assert!(output.starts_with(&format!("buffer {bytes} bytes at 0x")));
        assert_eq!(output.lines().count(), 1 + MAX_BUFFER_LINES);
        assert!(cache.len() as u64 <= (bytes as u64 / HUGEPAGE_SIZE) + 2);
    }
}
