//! Constellation CLI subcommand.
//!
//! This subcommand prints the bit-group to point table of a modulation
//! constellation.
//!
//! # Examples
//! ```shell
//! $ modulation-toolbox constellation QAM16
//! ```

use crate::{cli::*, simulation::modulation::Modulation};
use clap::Parser;
use std::error::Error;

/// Constellation CLI arguments.
#[derive(Debug, Parser)]
#[command(about = "Prints the constellation table of a modulation")]
pub struct Args {
    /// Modulation
    #[arg(value_enum)]
    modulation: Modulation,
}

impl Run for Args {
    fn run(&self) -> Result<(), Box<dyn Error>> {
        let constellation = self.modulation.constellation();
        let bits_per_symbol = constellation.bits_per_symbol();
        println!(
            "{} constellation: {} points, {} bits per symbol",
            self.modulation,
            constellation.order(),
            bits_per_symbol,
        );
        for (group, point) in constellation.points().iter().enumerate() {
            println!(
                "{:0width$b} -> {:+.6}{:+.6}j",
                group,
                point.re,
                point.im,
                width = bits_per_symbol
            );
        }
        Ok(())
    }
}
