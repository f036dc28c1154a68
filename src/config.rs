// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Protocol configuration.
//!
//! The multi-nonce schemes differ only in how many nonces each signer
//! contributes and in how the nonce weightings `alpha_{i,j}` are
//! derived, so they are all one protocol parameterized by a
//! `ProtocolConfig`.  Every participant and the verifier of partial
//! signatures must use the same configuration for a session.
//!
//! # Security
//!
//! Only `BindingMode::FiatShamir` and `BindingMode::MuSig2` with `ν ≥ 2`
//! are secure when signers run the two round protocol concurrently.
//! `ν = 1`, or `BindingMode::PlainSum`, leaves the aggregate nonce
//! computable before all commitments are fixed, which admits Wagner's
//! generalized birthday attack against concurrent sessions.  Those
//! configurations exist for comparison and for the three round
//! commit-reveal setting, and must be requested explicitly.
//!
//! Pedersen commitment nonces, as in the MBCJ scheme, are not offered:
//! every configuration here commits to nonces as plain points `r B`.

use tracing::warn;

use crate::errors::{MultiSigError, MultiSigResult};

/// Default nonce multiplicity `ν`.
pub const DEFAULT_NONCE_MULTIPLICITY: usize = 2;

/// How the nonce commitments of a session are weighted.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum BindingMode {
    /// Each commitment `R_{i,j}` receives its own weighting
    /// `alpha_{i,j} = H(X, R_{1,1}..R_{n,ν}, m, i, j)`.
    FiatShamir,
    /// All weightings equal one, so `R` is the plain sum of commitments.
    PlainSum,
    /// MuSig2 weighting: `alpha_{i,j} = b^j` with
    /// `b = H(X, R_1..R_ν, m)` over the column sums `R_j = Σ_i R_{i,j}`.
    MuSig2,
}

/// Configuration selecting one variant of the multi-nonce protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ProtocolConfig {
    nonce_multiplicity: usize,
    binding: BindingMode,
}

impl Default for ProtocolConfig {
    /// Fiat-Shamir bound nonces with `ν = 2`.
    fn default() -> ProtocolConfig {
        ProtocolConfig {
            nonce_multiplicity: DEFAULT_NONCE_MULTIPLICITY,
            binding: BindingMode::FiatShamir,
        }
    }
}

impl ProtocolConfig {
    /// Create a configuration, rejecting a zero nonce multiplicity.
    ///
    /// We log a warning whenever the resulting configuration is not safe
    /// for concurrent two round signing.
    pub fn new(nonce_multiplicity: usize, binding: BindingMode) -> MultiSigResult<ProtocolConfig> {
        if nonce_multiplicity == 0 {
            return Err(MultiSigError::ZeroNonceMultiplicity);
        }
        let config = ProtocolConfig { nonce_multiplicity, binding };
        if !config.is_two_round_safe() {
            warn!(
                nonce_multiplicity,
                ?binding,
                "multi-signature configuration is not safe for concurrent two round signing"
            );
        }
        Ok(config)
    }

    /// Fiat-Shamir bound weightings with `ν` nonces per signer.
    pub fn fiat_shamir(nonce_multiplicity: usize) -> MultiSigResult<ProtocolConfig> {
        ProtocolConfig::new(nonce_multiplicity, BindingMode::FiatShamir)
    }

    /// Unweighted nonce sums with `ν` nonces per signer.
    ///
    /// Never two round safe, see the module documentation.
    pub fn plain_sum(nonce_multiplicity: usize) -> MultiSigResult<ProtocolConfig> {
        ProtocolConfig::new(nonce_multiplicity, BindingMode::PlainSum)
    }

    /// MuSig2 style powers of one weighting with `ν` nonces per signer.
    pub fn musig2(nonce_multiplicity: usize) -> MultiSigResult<ProtocolConfig> {
        ProtocolConfig::new(nonce_multiplicity, BindingMode::MuSig2)
    }

    /// Number of nonces `ν` each signer contributes per session.
    pub fn nonce_multiplicity(&self) -> usize {
        self.nonce_multiplicity
    }

    /// Weighting applied to nonce commitments.
    pub fn binding(&self) -> BindingMode {
        self.binding
    }

    /// Whether signers may safely run many sessions concurrently
    /// with this configuration.
    pub fn is_two_round_safe(&self) -> bool {
        self.nonce_multiplicity >= 2 && self.binding != BindingMode::PlainSum
    }
}
