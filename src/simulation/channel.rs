//! Channel simulation.
//!
//! This module contains the simulation of a complex AWGN channel.

use num_complex::Complex;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// AWGN channel simulation.
///
/// This struct is used to add complex AWGN to symbols.
#[derive(Debug, Clone)]
pub struct AwgnChannel {
    distr: Normal<f64>,
}

impl AwgnChannel {
    /// Creates a new AWGN channel.
    ///
    /// The noise added to each of the real and imaginary parts of a symbol
    /// follows a normal distribution with mean zero and standard deviation
    /// `noise_sigma`.
    ///
    /// # Panics
    ///
    /// This function panics if `noise_sigma` is negative or not a number.
    pub fn new(noise_sigma: f64) -> AwgnChannel {
        assert!(noise_sigma >= 0.0);
        AwgnChannel {
            distr: Normal::new(0.0, noise_sigma).unwrap(),
        }
    }

    /// Creates the AWGN channel corresponding to an Eb/N0.
    ///
    /// The per-dimension noise standard deviation is derived from the Eb/N0
    /// in dB units and the bits per symbol of the modulation as in
    /// [`noise_sigma`].
    pub fn from_ebn0_db(ebn0_db: f64, bits_per_symbol: usize) -> AwgnChannel {
        AwgnChannel::new(noise_sigma(ebn0_db, bits_per_symbol))
    }

    /// Adds noise to a sequence of symbols.
    ///
    /// The noise is added in-place to the slice `symbols`, with independent
    /// samples in the real and imaginary part of each symbol. An [Rng] is
    /// used as source of randomness.
    pub fn add_noise<R: Rng>(&self, rng: &mut R, symbols: &mut [Complex<f64>]) {
        for x in symbols.iter_mut() {
            *x += Complex::new(self.distr.sample(rng), self.distr.sample(rng));
        }
    }

    /// Returns a noisy copy of a sequence of symbols.
    ///
    /// The input sequence is left untouched; the returned sequence has the
    /// same length.
    pub fn transmit<R: Rng>(&self, rng: &mut R, symbols: &[Complex<f64>]) -> Vec<Complex<f64>> {
        let mut noisy = symbols.to_vec();
        self.add_noise(rng, &mut noisy);
        noisy
    }
}

/// Returns the per-dimension noise standard deviation for an Eb/N0.
///
/// The Eb/N0 is converted from dB to linear units, the symbol energy to
/// noise ratio is Es/N0 = k Eb/N0 for a modulation with k bits per symbol
/// and unit-energy constellation, and the noise variance per dimension is
/// 1 / (2 Es/N0), splitting the noise equally between the real and imaginary
/// axes. The formula is defined for any real `ebn0_db`.
pub fn noise_sigma(ebn0_db: f64, bits_per_symbol: usize) -> f64 {
    let ebn0 = 10.0_f64.powf(0.1 * ebn0_db);
    let esn0 = bits_per_symbol as f64 * ebn0;
    (0.5 / esn0).sqrt()
}
