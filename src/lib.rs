//! # Modulation toolbox
//!
//! `modulation_toolbox` is a collection of Rust utilities to estimate the BER
//! of digital modulation schemes in an AWGN channel by Monte Carlo simulation
//! and to compare the estimates against the closed-form theoretical curves.
//!
//! It can be used as a Rust library or as a CLI tool that allows access from
//! the command line to the simulations implemented in `modulation-toolbox`.
//! See [`cli`] for documentation about the usage of the CLI tool.
//!
//! # Examples
//! ```
//! use modulation_toolbox::simulation::ber::{BerSweepBuilder, BitSourcePolicy};
//! use modulation_toolbox::simulation::modulation::Modulation;
//!
//! let sweep = BerSweepBuilder {
//!     modulations: &[Modulation::Bpsk, Modulation::Qam16],
//!     ebn0s_db: &[0.0, 2.0, 4.0],
//!     num_bits: 10_000,
//!     seed: 0,
//!     bit_source: BitSourcePolicy::Shared,
//!     reporter: None,
//! }
//! .build()
//! .unwrap();
//! let results = sweep.run().unwrap();
//! assert_eq!(results.simulated(Modulation::Bpsk).unwrap().len(), 3);
//! ```

#![warn(missing_docs)]

pub mod bit;
pub mod cli;
pub mod rand;
pub mod simulation;
