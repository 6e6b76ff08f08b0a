//! Theoretical BER CLI subcommand.
//!
//! This subcommand prints the closed-form and approximate BER curves of the
//! supported modulations without running a simulation.
//!
//! # Examples
//! ```shell
//! $ modulation-toolbox theory --min-ebn0 0 --max-ebn0 10 --step-ebn0 2
//! ```

use crate::{
    cli::*,
    simulation::{modulation::Modulation, theory::theoretical_ber},
};
use clap::Parser;
use std::error::Error;

/// Theoretical BER CLI arguments.
#[derive(Debug, Parser)]
#[command(about = "Prints theoretical BER curves")]
pub struct Args {
    /// Minimum Eb/N0 (dB)
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    min_ebn0: f64,
    /// Maximum Eb/N0 (dB)
    #[arg(long, default_value = "14.0", allow_negative_numbers = true)]
    max_ebn0: f64,
    /// Eb/N0 step (dB)
    #[arg(long, default_value = "1.0")]
    step_ebn0: f64,
    /// Modulations (defaults to all)
    #[arg(long = "modulation", value_enum)]
    modulations: Vec<Modulation>,
}

impl Run for Args {
    fn run(&self) -> Result<(), Box<dyn Error>> {
        let modulations: Vec<Modulation> = if self.modulations.is_empty() {
            enum_iterator::all().collect()
        } else {
            self.modulations.clone()
        };
        let num_ebn0s = ((self.max_ebn0 - self.min_ebn0) / self.step_ebn0).floor() as usize + 1;
        println!("  Eb/N0 | Modulation | Theoretical BER");
        println!("--------|------------|----------------");
        for point in 0..num_ebn0s {
            let ebn0_db = self.min_ebn0 + point as f64 * self.step_ebn0;
            for &modulation in &modulations {
                println!(
                    "{:7.2} | {:>10} | {:15.6e}",
                    ebn0_db,
                    modulation.to_string(),
                    theoretical_ber(modulation, ebn0_db)?
                );
            }
        }
        Ok(())
    }
}
