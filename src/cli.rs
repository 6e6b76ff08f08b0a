//! `modulation-toolbox` CLI application
//!
//! The CLI application is organized in several subcommands. The
//! supported subcommands can be seen by running `modulation-toolbox`.
//! See the modules below for examples and more information about
//! how to use each subcommand.

use clap::Parser;
use std::error::Error;

pub mod ber;
pub mod constellation;
pub mod theory;

/// Trait to run a CLI subcommand
pub trait Run {
    /// Run the CLI subcommand
    fn run(&self) -> Result<(), Box<dyn Error>>;
}

/// CLI arguments.
#[derive(Debug, Parser)]
#[command(
    author,
    version,
    name = "modulation-toolbox",
    about = "Modulation BER toolbox"
)]
pub enum Args {
    /// ber subcommand
    Ber(ber::Args),
    /// constellation subcommand
    Constellation(constellation::Args),
    /// theory subcommand
    Theory(theory::Args),
}

impl Run for Args {
    fn run(&self) -> Result<(), Box<dyn Error>> {
        match self {
            Args::Ber(x) => x.run(),
            Args::Constellation(x) => x.run(),
            Args::Theory(x) => x.run(),
        }
    }
}
