// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: v2p-probe entrypoint wiring env_logger to the shared CLI logic
fn main() {
    env_logger::init();
    if let Err(err) = virt2phys::cli::run() {
        eprintln!("v2p-probe: {err}");
        eprintln!("{}", virt2phys::cli::help());
        std::process::exit(2);
    }
}
