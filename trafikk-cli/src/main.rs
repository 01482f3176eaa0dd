//! ## trafikk-cli
//! **Command-line front end for the traffic simulator**
//!
//! - `trace`: space-time occupancy matrix of one run, plus its checksum
//! - `flow`: mean flow of one run after a transient
//! - `sweep`: flow table over a density/probability grid, as YAML

use clap::Parser;

mod commands;

use commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli)
}
