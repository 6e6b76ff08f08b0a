//! BER sweep CLI subcommand.
//!
//! This subcommand runs a Monte Carlo BER sweep over a range of Eb/N0 values
//! and prints the simulated results next to the theoretical curves.
//!
//! # Examples
//!
//! The default sweep (0 to 14 dB in 1 dB steps, one million bits per trial,
//! all modulations) can be run with
//! ```shell
//! $ modulation-toolbox ber
//! ```
//!
//! A 16-QAM-only sweep with reproducible parallel trials:
//! ```shell
//! $ modulation-toolbox ber --modulation QAM16 --seed 7 --parallel \
//!       --min-ebn0 0 --max-ebn0 12 --step-ebn0 0.5
//! ```

use crate::{
    cli::*,
    simulation::{
        ber::{BerSweepBuilder, BitSourcePolicy, Report, Reporter, Statistics, SweepResults},
        modulation::Modulation,
    },
};
use clap::Parser;
use console::Term;
use std::{
    error::Error,
    fs::File,
    io::Write,
    sync::mpsc::{self, Receiver},
    time::Duration,
};

/// BER sweep CLI arguments.
#[derive(Debug, Parser)]
#[command(about = "Performs a BER simulation sweep")]
pub struct Args {
    /// Number of bits per trial
    #[arg(long, default_value = "1000000")]
    num_bits: usize,
    /// Minimum Eb/N0 (dB)
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    min_ebn0: f64,
    /// Maximum Eb/N0 (dB)
    #[arg(long, default_value = "14.0", allow_negative_numbers = true)]
    max_ebn0: f64,
    /// Eb/N0 step (dB)
    #[arg(long, default_value = "1.0")]
    step_ebn0: f64,
    /// Modulations to simulate (defaults to all)
    #[arg(long = "modulation", value_enum)]
    modulations: Vec<Modulation>,
    /// RNG seed
    #[arg(long, default_value = "0")]
    seed: u64,
    /// Draw a fresh bit sequence for every (Eb/N0, modulation) trial
    #[arg(long)]
    fresh_bits: bool,
    /// Run the (Eb/N0, modulation) trials in parallel
    #[arg(long)]
    parallel: bool,
    /// Output file for simulation results
    #[arg(long)]
    output_file: Option<String>,
}

impl Run for Args {
    fn run(&self) -> Result<(), Box<dyn Error>> {
        let modulations = if self.modulations.is_empty() {
            enum_iterator::all().collect()
        } else {
            self.modulations.clone()
        };
        let num_ebn0s = ((self.max_ebn0 - self.min_ebn0) / self.step_ebn0).floor() as usize + 1;
        let ebn0s = (0..num_ebn0s)
            .map(|k| self.min_ebn0 + k as f64 * self.step_ebn0)
            .collect::<Vec<_>>();
        let output_file = self.output_file.as_ref().map(File::create).transpose()?;
        let (report_tx, report_rx) = mpsc::channel();
        let sweep = BerSweepBuilder {
            modulations: &modulations,
            ebn0s_db: &ebn0s,
            num_bits: self.num_bits,
            seed: self.seed,
            bit_source: if self.fresh_bits {
                BitSourcePolicy::Fresh
            } else {
                BitSourcePolicy::Shared
            },
            reporter: Some(Reporter { tx: report_tx }),
        }
        .build()?;
        self.write_details(std::io::stdout(), &modulations)?;
        let mut progress = Progress::new(report_rx);
        let progress = std::thread::spawn(move || progress.run());
        let run_result = if self.parallel {
            sweep.run_parallel()
        } else {
            sweep.run()
        };
        let results = match run_result {
            Ok(results) => results,
            Err(e) => {
                let _ = progress.join();
                return Err(e.into());
            }
        };
        // This block cannot actually be written with the ? operator
        #[allow(clippy::question_mark)]
        if let Err(e) = progress.join().unwrap() {
            return Err(e);
        }
        Self::write_results(std::io::stdout(), &results)?;
        if let Some(mut f) = output_file {
            self.write_details(&mut f, &modulations)?;
            Self::write_results(&mut f, &results)?;
        }
        Ok(())
    }
}

impl Args {
    fn write_details<W: Write>(&self, mut f: W, modulations: &[Modulation]) -> std::io::Result<()> {
        writeln!(f, "BER SWEEP PARAMETERS")?;
        writeln!(f, "--------------------")?;
        writeln!(f, "Simulation:")?;
        writeln!(f, " - Minimum Eb/N0: {:.2} dB", self.min_ebn0)?;
        writeln!(f, " - Maximum Eb/N0: {:.2} dB", self.max_ebn0)?;
        writeln!(f, " - Eb/N0 step: {:.2} dB", self.step_ebn0)?;
        writeln!(f, " - Bits per trial: {}", self.num_bits)?;
        writeln!(f, " - Seed: {}", self.seed)?;
        writeln!(
            f,
            " - Bit source: {}",
            if self.fresh_bits {
                "fresh per trial"
            } else {
                "shared per Eb/N0 point"
            }
        )?;
        writeln!(f, "Channel:")?;
        writeln!(
            f,
            " - Modulations: {}",
            modulations
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        writeln!(f)?;
        Ok(())
    }

    fn write_results<W: Write>(mut f: W, results: &SweepResults) -> std::io::Result<()> {
        writeln!(f)?;
        writeln!(f, "  Eb/N0 | Modulation | Simulated BER | Theoretical BER")?;
        writeln!(f, "--------|------------|---------------|----------------")?;
        for series in results.series() {
            for (point, &ebn0_db) in results.ebn0s_db().iter().enumerate() {
                writeln!(
                    f,
                    "{:7.2} | {:>10} | {:13.6e} | {:15.6e}",
                    ebn0_db,
                    series.modulation.to_string(),
                    series.simulated[point],
                    series.theoretical[point],
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Progress {
    rx: Receiver<Report>,
    term: Term,
}

impl Progress {
    fn new(rx: Receiver<Report>) -> Progress {
        Progress {
            rx,
            term: Term::stdout(),
        }
    }

    fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
        ctrlc::set_handler({
            let term = self.term.clone();
            move || {
                let _ = term.write_line("");
                let _ = term.show_cursor();
                std::process::exit(0);
            }
        })?;

        let ret = self.work();
        self.term.write_line("")?;
        self.term.show_cursor()?;
        ret
    }

    fn work(&mut self) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
        self.term.set_title("modulation-toolbox ber");
        self.term.hide_cursor()?;
        self.term.write_line(Self::format_header())?;
        loop {
            let Report::Statistics(stats) = self.rx.recv()? else {
                // BER sweep has finished
                return Ok(());
            };
            self.term.write_line(&Self::format_progress(&stats))?;
        }
    }

    fn format_header() -> &'static str {
        "  Eb/N0 | Modulation |     Bits | Bit errs |      BER |   Theory | Throughp | Elapsed\n\
         --------|------------|----------|----------|----------|----------|----------|----------"
    }

    fn format_progress(stats: &Statistics) -> String {
        format!(
            "{:7.2} | {:>10} | {:8} | {:8} | {:8.2e} | {:8.2e} | {:8.3} | {}",
            stats.ebn0_db,
            stats.modulation.to_string(),
            stats.num_bits,
            stats.bit_errors,
            stats.ber,
            stats.theoretical_ber,
            stats.throughput_mbps,
            humantime::format_duration(Duration::from_secs(stats.elapsed.as_secs()))
        )
    }
}
