//! Modulation and demodulation.
//!
//! This module implements routines for the mapping of bits to complex
//! constellation symbols and the hard-decision demapping of noisy symbols
//! back to bits.

use crate::bit::Bit;
use clap::ValueEnum;
use enum_iterator::Sequence;
use ndarray::{s, Array1, ArrayBase, Data, Ix1};
use num_complex::Complex;
use thiserror::Error;

/// Modulation error.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum Error {
    /// The number of bits is not divisible by the bits per symbol of the
    /// modulation.
    #[error("number of bits {num_bits} not divisible by {bits_per_symbol} bits per symbol")]
    BitsNotDivisible {
        /// Number of bits that was attempted to modulate.
        num_bits: usize,
        /// Bits per symbol of the modulation.
        bits_per_symbol: usize,
    },
}

/// Modulation scheme.
///
/// This enum represents the modulations that can be simulated. Each variant
/// determines a number of bits per symbol and a unit-average-energy
/// [`Constellation`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, ValueEnum, Sequence)]
#[clap(rename_all = "UPPER")]
pub enum Modulation {
    /// BPSK modulation.
    Bpsk,
    /// QPSK modulation.
    Qpsk,
    /// 16-QAM modulation.
    Qam16,
}

impl Modulation {
    /// Returns the number of bits carried by one symbol of the modulation.
    pub fn bits_per_symbol(&self) -> usize {
        match self {
            Modulation::Bpsk => 1,
            Modulation::Qpsk => 2,
            Modulation::Qam16 => 4,
        }
    }

    /// Returns the divisor that normalizes the constellation to unit average
    /// energy.
    pub fn normalization(&self) -> f64 {
        match self {
            Modulation::Bpsk => 1.0,
            Modulation::Qpsk => 2.0_f64.sqrt(),
            Modulation::Qam16 => 10.0_f64.sqrt(),
        }
    }

    /// Returns the constellation of the modulation.
    pub fn constellation(&self) -> Constellation {
        Constellation::new(*self)
    }

    /// Modulates a sequence of bits into symbols.
    ///
    /// The bits are partitioned into consecutive groups of
    /// [`bits_per_symbol`](Self::bits_per_symbol) bits, with the first bit of
    /// each group acting as the most significant, and each group is mapped to
    /// its constellation point. An error is returned if the number of bits is
    /// not divisible by the bits per symbol.
    pub fn modulate<S>(&self, bits: &ArrayBase<S, Ix1>) -> Result<Vec<Complex<f64>>, Error>
    where
        S: Data<Elem = Bit>,
    {
        let bits_per_symbol = self.bits_per_symbol();
        if bits.len() % bits_per_symbol != 0 {
            return Err(Error::BitsNotDivisible {
                num_bits: bits.len(),
                bits_per_symbol,
            });
        }
        let constellation = self.constellation();
        let num_symbols = bits.len() / bits_per_symbol;
        let mut symbols = Vec::with_capacity(num_symbols);
        for symbol in 0..num_symbols {
            let group = bits
                .slice(s![symbol * bits_per_symbol..(symbol + 1) * bits_per_symbol])
                .iter()
                .fold(0, |acc, &bit| (acc << 1) | usize::from(u8::from(bit)));
            symbols.push(constellation.point(group));
        }
        Ok(symbols)
    }

    /// Demodulates a sequence of noisy symbols into bits.
    ///
    /// BPSK and QPSK use a sign threshold on each axis (a negative component
    /// decodes as a 1 bit, matching the modulator mapping). 16-QAM selects
    /// the nearest constellation point in Euclidean distance by a linear scan
    /// and recovers the bit group from the index of the winning point. The
    /// output length is the number of symbols times the bits per symbol.
    ///
    /// Demodulation never fails: even under arbitrarily large noise a nearest
    /// decision is returned.
    pub fn demodulate(&self, symbols: &[Complex<f64>]) -> Array1<Bit> {
        let mut bits = Vec::with_capacity(symbols.len() * self.bits_per_symbol());
        match self {
            Modulation::Bpsk => {
                for symbol in symbols {
                    bits.push(Bit::from(symbol.re < 0.0));
                }
            }
            Modulation::Qpsk => {
                for symbol in symbols {
                    bits.push(Bit::from(symbol.re < 0.0));
                    bits.push(Bit::from(symbol.im < 0.0));
                }
            }
            Modulation::Qam16 => {
                let constellation = self.constellation();
                let bits_per_symbol = self.bits_per_symbol();
                for &symbol in symbols {
                    let group = constellation.nearest(symbol);
                    for bit in (0..bits_per_symbol).rev() {
                        bits.push(Bit::from((group >> bit) & 1 == 1));
                    }
                }
            }
        }
        Array1::from_vec(bits)
    }
}

impl std::str::FromStr for Modulation {
    type Err = String;

    fn from_str(s: &str) -> Result<Modulation, String> {
        Ok(match s {
            "BPSK" => Modulation::Bpsk,
            "QPSK" => Modulation::Qpsk,
            "16QAM" | "QAM16" => Modulation::Qam16,
            _ => Err(format!("invalid modulation {s}"))?,
        })
    }
}

impl std::fmt::Display for Modulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Modulation::Bpsk => "BPSK",
                Modulation::Qpsk => "QPSK",
                Modulation::Qam16 => "16QAM",
            }
        )
    }
}

// 16-QAM bit-group to point table, indexed by the group value with the first
// bit as MSB. Gray coded on each axis: the first two bits select the real
// coordinate in {00: -3, 01: -1, 11: +1, 10: +3} and the last two bits select
// the imaginary coordinate with the same coding.
const QAM16_POINTS: [(f64, f64); 16] = [
    (-3.0, -3.0),
    (-3.0, -1.0),
    (-3.0, 3.0),
    (-3.0, 1.0),
    (-1.0, -3.0),
    (-1.0, -1.0),
    (-1.0, 3.0),
    (-1.0, 1.0),
    (3.0, -3.0),
    (3.0, -1.0),
    (3.0, 3.0),
    (3.0, 1.0),
    (1.0, -3.0),
    (1.0, -1.0),
    (1.0, 3.0),
    (1.0, 1.0),
];

/// Indexed constellation table.
///
/// The table stores the unit-average-energy constellation points of a
/// modulation indexed by the value of the bit group, with the first bit of
/// the group as the most significant bit. Demapping works on indices, so bit
/// groups are recovered from the nearest point without ever comparing
/// floating point values for equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Constellation {
    points: Vec<Complex<f64>>,
    bits_per_symbol: usize,
}

impl Constellation {
    fn new(modulation: Modulation) -> Constellation {
        let points: Vec<Complex<f64>> = match modulation {
            Modulation::Bpsk => vec![Complex::new(1.0, 0.0), Complex::new(-1.0, 0.0)],
            Modulation::Qpsk => (0..4)
                .map(|group| {
                    let re = if group & 0b10 == 0 { 1.0 } else { -1.0 };
                    let im = if group & 0b01 == 0 { 1.0 } else { -1.0 };
                    Complex::new(re, im)
                })
                .collect(),
            Modulation::Qam16 => QAM16_POINTS
                .iter()
                .map(|&(re, im)| Complex::new(re, im))
                .collect(),
        };
        let scale = modulation.normalization();
        Constellation {
            points: points.into_iter().map(|p| p / scale).collect(),
            bits_per_symbol: modulation.bits_per_symbol(),
        }
    }

    /// Returns the number of points of the constellation.
    pub fn order(&self) -> usize {
        self.points.len()
    }

    /// Returns the number of bits carried by one constellation point.
    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    /// Returns the point corresponding to a bit group.
    ///
    /// # Panics
    ///
    /// Panics if `group` is not smaller than the constellation order.
    pub fn point(&self, group: usize) -> Complex<f64> {
        self.points[group]
    }

    /// Returns all the points of the constellation, indexed by bit group.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// Returns the bit group whose point is nearest to a symbol.
    ///
    /// The distance is the Euclidean distance in the complex plane. Exact
    /// ties are resolved in favor of the smallest bit group; under continuous
    /// noise they happen with probability zero.
    pub fn nearest(&self, symbol: Complex<f64>) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (group, &point) in self.points.iter().enumerate() {
            let distance = (symbol - point).norm_sqr();
            if distance < best_distance {
                best = group;
                best_distance = distance;
            }
        }
        best
    }
}
