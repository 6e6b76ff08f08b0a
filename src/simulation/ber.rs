//! BER simulation.
//!
//! This module contains the Monte Carlo BER sweep: random bits are mapped to
//! symbols, sent through an AWGN channel at each Eb/N0 of a range, and
//! demodulated; the bit errors are counted and the empirical BER is recorded
//! next to the theoretical one.

use super::{channel::AwgnChannel, modulation::Modulation, theory};
use crate::{
    bit::Bit,
    rand::{Rng, SeedableRng},
};
use ndarray::{Array1, ArrayBase, Data, Ix1};
use rand::{distributions::Standard, Rng as _};
use rayon::prelude::*;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// BER simulation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The number of bits per trial is zero.
    #[error("the number of bits per trial must be positive")]
    NumBitsZero,
    /// The number of bits per trial is not divisible by the bits per symbol
    /// of one of the modulations.
    #[error(
        "number of bits {num_bits} not divisible by the {bits_per_symbol} \
         bits per symbol of {modulation}"
    )]
    NumBitsNotDivisible {
        /// Number of bits per trial.
        num_bits: usize,
        /// Modulation whose bits per symbol does not divide the bit count.
        modulation: Modulation,
        /// Bits per symbol of the modulation.
        bits_per_symbol: usize,
    },
    /// The transmitted and received sequences have different lengths.
    #[error(
        "transmitted and received sequences have different lengths \
         ({transmitted} and {received})"
    )]
    LengthMismatch {
        /// Length of the transmitted sequence.
        transmitted: usize,
        /// Length of the received sequence.
        received: usize,
    },
    /// Modulation error.
    #[error("modulation error: {0}")]
    Modulation(#[from] super::modulation::Error),
    /// Theoretical BER error.
    #[error("theoretical BER error: {0}")]
    Theory(#[from] theory::Error),
}

/// Bit source policy.
///
/// Controls how the random bit sequences of the trials at the same Eb/N0
/// point are drawn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub enum BitSourcePolicy {
    /// One bit sequence per Eb/N0 point, reused by every modulation.
    ///
    /// This keeps the results of the different modulations at the same noise
    /// point bit-for-bit comparable, at the cost of correlating them.
    #[default]
    Shared,
    /// An independent bit sequence per (Eb/N0, modulation) trial.
    Fresh,
}

/// Generates a sequence of independent uniformly distributed random bits.
pub fn random_bits<R: rand::Rng>(rng: &mut R, num_bits: usize) -> Array1<Bit> {
    Array1::from_iter(rng.sample_iter::<bool, Standard>(Standard).map(Bit::from).take(num_bits))
}

/// Counts the number of positions in which two bit sequences differ.
///
/// An error is returned if the sequences have different lengths.
pub fn count_bit_errors<S1, S2>(
    transmitted: &ArrayBase<S1, Ix1>,
    received: &ArrayBase<S2, Ix1>,
) -> Result<u64, Error>
where
    S1: Data<Elem = Bit>,
    S2: Data<Elem = Bit>,
{
    if transmitted.len() != received.len() {
        return Err(Error::LengthMismatch {
            transmitted: transmitted.len(),
            received: received.len(),
        });
    }
    Ok(transmitted
        .iter()
        .zip(received.iter())
        .filter(|(&a, &b)| a != b)
        .count() as u64)
}

/// BER trial statistics.
///
/// This structure contains the statistics for a single (Eb/N0, modulation)
/// trial of a BER sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    /// Modulation of the trial.
    pub modulation: Modulation,
    /// Eb/N0 in dB units.
    pub ebn0_db: f64,
    /// Number of bits tested.
    pub num_bits: u64,
    /// Number of bit errors.
    pub bit_errors: u64,
    /// Empirical bit error rate.
    pub ber: f64,
    /// Theoretical bit error rate at the same Eb/N0.
    pub theoretical_ber: f64,
    /// Elapsed time for this trial.
    pub elapsed: Duration,
    /// Throughput in Mbps.
    pub throughput_mbps: f64,
}

/// Progress report.
///
/// Reports of this type are sent by the sweep through the [`Reporter`]
/// channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    /// Statistics of a completed trial.
    Statistics(Statistics),
    /// The sweep has finished.
    Finished,
}

/// Progress reporter.
///
/// A reporter can be handed to a [`BerSweep`] to receive a
/// [`Report::Statistics`] after every completed trial and a final
/// [`Report::Finished`].
#[derive(Debug, Clone)]
pub struct Reporter {
    /// Channel through which the reports are sent.
    pub tx: mpsc::Sender<Report>,
}

impl Reporter {
    fn report(&self, report: Report) {
        // A dropped receiver only disables progress reporting.
        let _ = self.tx.send(report);
    }
}

/// Simulated and theoretical BER curves for one modulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemeSeries {
    /// Modulation.
    pub modulation: Modulation,
    /// Empirical BER for each Eb/N0, in sweep order.
    pub simulated: Vec<f64>,
    /// Theoretical BER for each Eb/N0, in sweep order.
    pub theoretical: Vec<f64>,
}

/// Results of a BER sweep.
///
/// The results contain the swept Eb/N0 values, one simulated and one
/// theoretical BER series per modulation preserving the Eb/N0 order, and the
/// per-trial statistics in execution order.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResults {
    ebn0s_db: Vec<f64>,
    series: Vec<SchemeSeries>,
    statistics: Vec<Statistics>,
}

impl SweepResults {
    fn from_statistics(
        ebn0s_db: Vec<f64>,
        modulations: &[Modulation],
        statistics: Vec<Statistics>,
    ) -> SweepResults {
        let mut series: Vec<SchemeSeries> = modulations
            .iter()
            .map(|&modulation| SchemeSeries {
                modulation,
                simulated: Vec::with_capacity(ebn0s_db.len()),
                theoretical: Vec::with_capacity(ebn0s_db.len()),
            })
            .collect();
        for (trial, stats) in statistics.iter().enumerate() {
            let entry = &mut series[trial % modulations.len()];
            entry.simulated.push(stats.ber);
            entry.theoretical.push(stats.theoretical_ber);
        }
        SweepResults {
            ebn0s_db,
            series,
            statistics,
        }
    }

    /// Returns the Eb/N0 values of the sweep in dB units.
    pub fn ebn0s_db(&self) -> &[f64] {
        &self.ebn0s_db
    }

    /// Returns the per-modulation BER series, in the order in which the
    /// modulations were simulated.
    pub fn series(&self) -> &[SchemeSeries] {
        &self.series
    }

    /// Returns the simulated BER curve of a modulation.
    pub fn simulated(&self, modulation: Modulation) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.modulation == modulation)
            .map(|s| s.simulated.as_slice())
    }

    /// Returns the theoretical BER curve of a modulation.
    pub fn theoretical(&self, modulation: Modulation) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|s| s.modulation == modulation)
            .map(|s| s.theoretical.as_slice())
    }

    /// Returns the statistics of every trial, in execution order.
    pub fn statistics(&self) -> &[Statistics] {
        &self.statistics
    }
}

/// BER sweep builder.
///
/// This struct contains all the parameters needed to create a BER sweep.
#[derive(Debug)]
pub struct BerSweepBuilder<'a> {
    /// Modulations to simulate, in the order in which they are run at each
    /// Eb/N0 point.
    pub modulations: &'a [Modulation],
    /// Eb/N0 values in dB units, in the order in which they are swept.
    pub ebn0s_db: &'a [f64],
    /// Number of bits per trial.
    pub num_bits: usize,
    /// RNG seed.
    pub seed: u64,
    /// Bit source policy.
    pub bit_source: BitSourcePolicy,
    /// Optional progress reporter.
    pub reporter: Option<Reporter>,
}

impl BerSweepBuilder<'_> {
    /// Creates the BER sweep.
    ///
    /// The bit count is validated up front: it must be positive and
    /// divisible by the bits per symbol of every modulation in the sweep, so
    /// that no trial silently truncates its bit sequence.
    ///
    /// This function only defines the sweep. To run it it is necessary to
    /// call [`BerSweep::run`] or [`BerSweep::run_parallel`].
    pub fn build(self) -> Result<BerSweep, Error> {
        if self.num_bits == 0 {
            return Err(Error::NumBitsZero);
        }
        for &modulation in self.modulations {
            let bits_per_symbol = modulation.bits_per_symbol();
            if self.num_bits % bits_per_symbol != 0 {
                return Err(Error::NumBitsNotDivisible {
                    num_bits: self.num_bits,
                    modulation,
                    bits_per_symbol,
                });
            }
        }
        Ok(BerSweep {
            modulations: self.modulations.to_owned(),
            ebn0s_db: self.ebn0s_db.to_owned(),
            num_bits: self.num_bits,
            seed: self.seed,
            bit_source: self.bit_source,
            reporter: self.reporter,
        })
    }
}

/// BER sweep.
///
/// This struct is used to run a Monte Carlo BER sweep over a set of
/// modulations and a range of Eb/N0 values. It is created with a
/// [`BerSweepBuilder`].
#[derive(Debug)]
pub struct BerSweep {
    modulations: Vec<Modulation>,
    ebn0s_db: Vec<f64>,
    num_bits: usize,
    seed: u64,
    bit_source: BitSourcePolicy,
    reporter: Option<Reporter>,
}

impl BerSweep {
    /// Runs the BER sweep sequentially.
    ///
    /// The run is deterministic given the seed. The RNG draw order is fixed:
    /// for each Eb/N0 in sweep order, the bit sequence is drawn first (once
    /// per point under [`BitSourcePolicy::Shared`], once per trial under
    /// [`BitSourcePolicy::Fresh`]) and the channel noise is drawn afterwards
    /// for each modulation in the order in which they were listed.
    ///
    /// An error aborts the sweep and discards the statistics accumulated
    /// before the failing trial.
    pub fn run(self) -> Result<SweepResults, Error> {
        let mut rng = Rng::seed_from_u64(self.seed);
        let mut statistics = Vec::with_capacity(self.ebn0s_db.len() * self.modulations.len());
        for &ebn0_db in &self.ebn0s_db {
            let shared_bits = match self.bit_source {
                BitSourcePolicy::Shared => Some(random_bits(&mut rng, self.num_bits)),
                BitSourcePolicy::Fresh => None,
            };
            for &modulation in &self.modulations {
                let fresh_bits;
                let bits = match &shared_bits {
                    Some(bits) => bits,
                    None => {
                        fresh_bits = random_bits(&mut rng, self.num_bits);
                        &fresh_bits
                    }
                };
                let stats = Self::run_trial(&mut rng, modulation, ebn0_db, bits)?;
                if let Some(reporter) = &self.reporter {
                    reporter.report(Report::Statistics(stats.clone()));
                }
                statistics.push(stats);
            }
        }
        if let Some(reporter) = &self.reporter {
            reporter.report(Report::Finished);
        }
        Ok(SweepResults::from_statistics(
            self.ebn0s_db,
            &self.modulations,
            statistics,
        ))
    }

    /// Runs the BER sweep in parallel.
    ///
    /// Each (Eb/N0, modulation) trial runs as an independent rayon task with
    /// its own RNG derived from the seed and the trial index through the
    /// ChaCha stream number, so the results are reproducible for a fixed
    /// seed and uncorrelated across trials. Bit sequences are always drawn
    /// fresh per trial in this mode, regardless of the bit source policy.
    pub fn run_parallel(self) -> Result<SweepResults, Error> {
        let num_bits = self.num_bits;
        let seed = self.seed;
        let trials: Vec<(f64, Modulation, Option<Reporter>)> = self
            .ebn0s_db
            .iter()
            .flat_map(|&ebn0_db| {
                self.modulations
                    .iter()
                    .map(move |&modulation| (ebn0_db, modulation))
            })
            .map(|(ebn0_db, modulation)| (ebn0_db, modulation, self.reporter.clone()))
            .collect();
        let statistics = trials
            .into_par_iter()
            .enumerate()
            .map(|(trial, (ebn0_db, modulation, reporter))| {
                let mut rng = Rng::seed_from_u64(seed);
                // Stream zero is left to the sequential runner.
                rng.set_stream(trial as u64 + 1);
                let bits = random_bits(&mut rng, num_bits);
                let stats = Self::run_trial(&mut rng, modulation, ebn0_db, &bits)?;
                if let Some(reporter) = reporter {
                    reporter.report(Report::Statistics(stats.clone()));
                }
                Ok(stats)
            })
            .collect::<Result<Vec<_>, Error>>()?;
        if let Some(reporter) = &self.reporter {
            reporter.report(Report::Finished);
        }
        Ok(SweepResults::from_statistics(
            self.ebn0s_db,
            &self.modulations,
            statistics,
        ))
    }

    fn run_trial<R: rand::Rng>(
        rng: &mut R,
        modulation: Modulation,
        ebn0_db: f64,
        bits: &Array1<Bit>,
    ) -> Result<Statistics, Error> {
        let start = Instant::now();
        // Evaluated before the channel is built: AwgnChannel::new panics on
        // a non-finite noise sigma.
        let theoretical_ber = theory::theoretical_ber(modulation, ebn0_db)?;
        let symbols = modulation.modulate(bits)?;
        let channel = AwgnChannel::from_ebn0_db(ebn0_db, modulation.bits_per_symbol());
        let noisy = channel.transmit(rng, &symbols);
        let received = modulation.demodulate(&noisy);
        let bit_errors = count_bit_errors(bits, &received)?;
        let elapsed = start.elapsed();
        let num_bits = bits.len();
        Ok(Statistics {
            modulation,
            ebn0_db,
            num_bits: num_bits as u64,
            bit_errors,
            ber: bit_errors as f64 / num_bits as f64,
            theoretical_ber,
            elapsed,
            throughput_mbps: 1e-6 * num_bits as f64 / elapsed.as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use enum_iterator::all;

    fn builder<'a>(
        modulations: &'a [Modulation],
        ebn0s_db: &'a [f64],
        num_bits: usize,
    ) -> BerSweepBuilder<'a> {
        BerSweepBuilder {
            modulations,
            ebn0s_db,
            num_bits,
            seed: 0,
            bit_source: BitSourcePolicy::Shared,
            reporter: None,
        }
    }

    #[test]
    fn num_bits_zero() {
        let modulations = [Modulation::Bpsk];
        assert_eq!(
            builder(&modulations, &[0.0], 0).build().unwrap_err(),
            Error::NumBitsZero
        );
    }

    #[test]
    fn num_bits_not_divisible() {
        let modulations = [Modulation::Bpsk, Modulation::Qam16];
        assert_eq!(
            builder(&modulations, &[0.0], 6).build().unwrap_err(),
            Error::NumBitsNotDivisible {
                num_bits: 6,
                modulation: Modulation::Qam16,
                bits_per_symbol: 4
            }
        );
    }

    #[test]
    fn random_bits_balance() {
        let mut rng = Rng::seed_from_u64(0);
        let bits = random_bits(&mut rng, 10_000);
        assert_eq!(bits.len(), 10_000);
        let ones = bits.iter().filter(|&&b| bool::from(b)).count();
        assert!((4_500..=5_500).contains(&ones));
    }

    #[test]
    fn count_errors() {
        let a = Array1::from_vec(vec![Bit::from(false), Bit::from(true), Bit::from(true)]);
        let b = Array1::from_vec(vec![Bit::from(true), Bit::from(true), Bit::from(false)]);
        assert_eq!(count_bit_errors(&a, &a).unwrap(), 0);
        assert_eq!(count_bit_errors(&a, &b).unwrap(), 2);
        let c = Array1::from_vec(vec![Bit::from(false)]);
        assert_eq!(
            count_bit_errors(&a, &c).unwrap_err(),
            Error::LengthMismatch {
                transmitted: 3,
                received: 1
            }
        );
    }

    #[test]
    fn sweep_shape_preserves_order() {
        let modulations: Vec<Modulation> = all().collect();
        let ebn0s = [0.0, 2.0, 4.0];
        let results = builder(&modulations, &ebn0s, 400)
            .build()
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(results.ebn0s_db(), &ebn0s);
        assert_eq!(results.series().len(), modulations.len());
        for (series, &modulation) in results.series().iter().zip(&modulations) {
            assert_eq!(series.modulation, modulation);
            assert_eq!(series.simulated.len(), ebn0s.len());
            assert_eq!(series.theoretical.len(), ebn0s.len());
        }
        let statistics = results.statistics();
        assert_eq!(statistics.len(), ebn0s.len() * modulations.len());
        for (trial, stats) in statistics.iter().enumerate() {
            assert_eq!(stats.modulation, modulations[trial % modulations.len()]);
            assert_eq!(stats.ebn0_db, ebn0s[trial / modulations.len()]);
            assert_eq!(stats.num_bits, 400);
        }
    }

    #[test]
    fn error_free_at_high_ebn0() {
        let modulations: Vec<Modulation> = all().collect();
        let results = builder(&modulations, &[60.0], 4_000)
            .build()
            .unwrap()
            .run()
            .unwrap();
        for series in results.series() {
            assert_eq!(series.simulated, vec![0.0]);
        }
    }

    #[test]
    fn ber_decreases_with_ebn0() {
        let modulations = [Modulation::Bpsk];
        let results = builder(&modulations, &[0.0, 10.0], 100_000)
            .build()
            .unwrap()
            .run()
            .unwrap();
        let simulated = results.simulated(Modulation::Bpsk).unwrap();
        assert!(simulated[0] > simulated[1]);
    }

    #[test]
    fn ber_close_to_theory() {
        // At 4 dB and 1e5 bits the estimates sit many standard deviations
        // inside a factor-of-two band around the closed forms.
        let modulations: Vec<Modulation> = all().collect();
        let results = builder(&modulations, &[4.0], 100_000)
            .build()
            .unwrap()
            .run()
            .unwrap();
        for series in results.series() {
            let simulated = series.simulated[0];
            let theoretical = series.theoretical[0];
            assert!(simulated > 0.5 * theoretical, "{}", series.modulation);
            assert!(simulated < 2.0 * theoretical, "{}", series.modulation);
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let modulations: Vec<Modulation> = all().collect();
        let ebn0s = [0.0, 4.0];
        for bit_source in [BitSourcePolicy::Shared, BitSourcePolicy::Fresh] {
            let run = || {
                let mut b = builder(&modulations, &ebn0s, 1_200);
                b.bit_source = bit_source;
                b.build().unwrap().run().unwrap()
            };
            let a = run();
            let b = run();
            assert_eq!(a.series(), b.series());
        }
    }

    #[test]
    fn parallel_deterministic_and_error_free() {
        let modulations: Vec<Modulation> = all().collect();
        let build = || builder(&modulations, &[60.0, 61.0], 2_000).build().unwrap();
        let a = build().run_parallel().unwrap();
        let b = build().run_parallel().unwrap();
        assert_eq!(a.series(), b.series());
        for series in a.series() {
            assert_eq!(series.simulated, vec![0.0, 0.0]);
        }
    }

    #[test]
    fn reporter_protocol() {
        let modulations = [Modulation::Bpsk, Modulation::Qpsk];
        let (tx, rx) = mpsc::channel();
        let mut b = builder(&modulations, &[8.0, 10.0], 1_000);
        b.reporter = Some(Reporter { tx });
        b.build().unwrap().run().unwrap();
        let reports: Vec<Report> = rx.iter().collect();
        assert_eq!(reports.len(), 5);
        assert!(reports[..4]
            .iter()
            .all(|r| matches!(r, Report::Statistics(_))));
        assert!(matches!(reports[4], Report::Finished));
    }
}
