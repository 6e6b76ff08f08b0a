//! Theoretical BER curves.
//!
//! This module contains the closed-form and approximate BER expressions for
//! the supported modulations in an AWGN channel, which the simulated curves
//! are compared against.

use super::modulation::Modulation;
use thiserror::Error;

/// Theoretical BER error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The Eb/N0 is not a finite number.
    #[error("Eb/N0 value {0} dB is not finite")]
    EbN0NotFinite(f64),
}

/// Returns the theoretical BER of a modulation at a given Eb/N0.
///
/// BPSK and Gray-coded QPSK share the exact expression
/// `0.5 erfc(sqrt(Eb/N0))`, since the two QPSK axes behave as independent
/// BPSK channels. 16-QAM uses the nearest-neighbour approximation
/// `(3/8) erfc(sqrt(0.4 Eb/N0))`.
///
/// An error is returned if `ebn0_db` is not finite, instead of letting a NaN
/// propagate into the curves.
pub fn theoretical_ber(modulation: Modulation, ebn0_db: f64) -> Result<f64, Error> {
    if !ebn0_db.is_finite() {
        return Err(Error::EbN0NotFinite(ebn0_db));
    }
    let ebn0 = 10.0_f64.powf(0.1 * ebn0_db);
    Ok(match modulation {
        Modulation::Bpsk | Modulation::Qpsk => 0.5 * erfc(ebn0.sqrt()),
        Modulation::Qam16 => 0.375 * erfc((0.4 * ebn0).sqrt()),
    })
}

// ln(sqrt(pi))
const LN_SQRT_PI: f64 = 0.5723649429247001;

const MAX_ITERATIONS: usize = 300;

/// Complementary error function.
///
/// Computed through the regularized incomplete gamma functions,
/// `erfc(x) = Q(1/2, x^2)` for nonnegative `x`, using the power series of
/// the lower function for small arguments and a Lentz continued fraction
/// otherwise. The relative accuracy is close to machine precision, far
/// inside the 1e-10 needed for BER curves.
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let x2 = x * x;
    if x2 < 1.5 {
        1.0 - lower_gamma_half(x2)
    } else {
        upper_gamma_half(x2)
    }
}

// Regularized lower incomplete gamma function P(1/2, x) by power series.
fn lower_gamma_half(x: f64) -> f64 {
    let mut ap = 0.5;
    let mut term = 2.0;
    let mut sum = 2.0;
    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * f64::EPSILON {
            break;
        }
    }
    sum * (-x + 0.5 * x.ln() - LN_SQRT_PI).exp()
}

// Regularized upper incomplete gamma function Q(1/2, x) by continued
// fraction, evaluated with the modified Lentz method.
fn upper_gamma_half(x: f64) -> f64 {
    const FPMIN: f64 = f64::MIN_POSITIVE / f64::EPSILON;
    let a = 0.5;
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=MAX_ITERATIONS {
        let an = -(i as f64) * (i as f64 - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < f64::EPSILON {
            break;
        }
    }
    (-x + a * x.ln() - LN_SQRT_PI).exp() * h
}

#[cfg(test)]
mod test {
    use super::*;
    use enum_iterator::all;

    #[test]
    fn erfc_tabulated_values() {
        let table = [
            (0.5, 0.4795001221869535),
            (1.0, 0.15729920705028513),
            (1.5, 0.033894853524689273),
            (2.0, 0.004677734981047266),
            (3.0, 2.209049699858544e-5),
        ];
        for (x, expected) in table {
            assert!(
                ((erfc(x) - expected) / expected).abs() < 1e-12,
                "erfc({x}) = {}",
                erfc(x)
            );
        }
    }

    #[test]
    fn erfc_edge_values() {
        assert_eq!(erfc(0.0), 1.0);
        for x in [0.3, 0.9, 1.7, 2.5] {
            assert_eq!(erfc(-x), 2.0 - erfc(x));
        }
    }

    #[test]
    fn bpsk_at_0db() {
        // 0.5 erfc(1)
        let ber = theoretical_ber(Modulation::Bpsk, 0.0).unwrap();
        assert!((ber - 0.07864960352514257).abs() < 1e-10);
    }

    #[test]
    fn qpsk_equals_bpsk() {
        for ebn0_db in [-3.0, 0.0, 2.5, 5.0, 10.0, 14.0] {
            assert_eq!(
                theoretical_ber(Modulation::Bpsk, ebn0_db).unwrap(),
                theoretical_ber(Modulation::Qpsk, ebn0_db).unwrap()
            );
        }
    }

    #[test]
    fn qam16_at_10db() {
        // (3/8) erfc(sqrt(4)) = (3/8) erfc(2)
        let ber = theoretical_ber(Modulation::Qam16, 10.0).unwrap();
        assert!((ber - 0.375 * 0.004677734981047266).abs() < 1e-12);
    }

    #[test]
    fn qam16_worse_than_bpsk() {
        for ebn0_db in [0.0, 4.0, 8.0, 12.0] {
            assert!(
                theoretical_ber(Modulation::Qam16, ebn0_db).unwrap()
                    > theoretical_ber(Modulation::Bpsk, ebn0_db).unwrap()
            );
        }
    }

    #[test]
    fn decreasing_in_ebn0() {
        for modulation in all::<Modulation>() {
            let bers: Vec<f64> = (0..15)
                .map(|db| theoretical_ber(modulation, f64::from(db)).unwrap())
                .collect();
            assert!(bers.windows(2).all(|w| w[1] < w[0]), "{modulation}");
        }
    }

    #[test]
    fn non_finite_ebn0() {
        for ebn0_db in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                theoretical_ber(Modulation::Bpsk, ebn0_db),
                Err(Error::EbN0NotFinite(_))
            ));
        }
    }
}
