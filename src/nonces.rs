// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Signing nonces, their commitments, and nonce aggregation.
//!
//! In the first round every signer `i` samples `ν` secret nonces
//! `r_{i,1}..r_{i,ν}` and broadcasts the commitments `R_{i,j} = r_{i,j} B`.
//! Once all `n` rows of commitments are collected into a `NonceMatrix`,
//! every party computes identical weightings `alpha_{i,j}` and the
//! aggregate nonce `R = Σ_i Σ_j alpha_{i,j} R_{i,j}`.
//!
//! With the default Fiat-Shamir binding, `alpha_{i,j}` hashes the
//! message, the aggregate key and the entire matrix, so no party can
//! predict any weighting before every commitment is fixed.  This is
//! what defeats the Wagner-style attack of
//! "On the Provable Security of Two-Round Multi-Signatures" by
//! Manu Drijvers, Kasra Edalatnejad, Bryan Ford, and Gregory Neven
//! https://eprint.iacr.org/2018/417
//! against concurrent sessions.
//!
//! # Security
//!
//! A `SigningNonces` must sign only once.  Reusing a nonce with two
//! different challenges reveals the signer's secret key.  We make the
//! type neither `Clone` nor `Copy`, consume it when signing, and zero
//! it when dropped, but nonces written out of process are beyond our
//! reach.

use alloc::vec;
use alloc::vec::Vec;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::ZeroizeOnDrop;

use crate::aggregation::AggregatePublicKey;
use crate::config::{BindingMode, ProtocolConfig};
use crate::context::{
    SigningTranscript, MUSIG2_COEFFICIENT_LABEL, NONCE_COEFFICIENT_LABEL, NONCE_GENERATION_LABEL,
};
use crate::errors::{MultiSigError, MultiSigResult};
use crate::keys::SecretKey;
use crate::points::{decode_point, RistrettoBoth};

/// The length of a `NonceCommitment`, in bytes.
pub const NONCE_COMMITMENT_LENGTH: usize = 32;

/// A secret signing nonce `r`.
#[derive(ZeroizeOnDrop)]
pub(crate) struct Nonce(pub(crate) Scalar);

impl Nonce {
    /// Generates a new uniformly random signing nonce by sourcing fresh
    /// randomness and combining with the signer's secret key, to hedge
    /// against a bad RNG.
    pub(crate) fn new<R>(secret: &SecretKey, position: usize, rng: R) -> Nonce
    where R: RngCore + CryptoRng,
    {
        let mut t = Transcript::new(NONCE_GENERATION_LABEL);
        t.commit_index(b"j", position as u64);
        Nonce(t.witness_scalar(b"secret", &[&secret.key.as_bytes()[..]], rng))
    }

    /// The public commitment `r B` to this nonce.
    pub(crate) fn commitment(&self) -> NonceCommitment {
        NonceCommitment(RistrettoBoth::from_point(RistrettoPoint::mul_base(&self.0)))
    }
}

/// A public commitment `R_{i,j} = r_{i,j} B` to one signing nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NonceCommitment(pub(crate) RistrettoBoth);

impl NonceCommitment {
    const DESCRIPTION: &'static str = "A nonce commitment represented as a 32-byte Ristretto compressed point";

    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        self.0.as_compressed()
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        self.0.as_point()
    }

    /// Convert this commitment to a byte array.
    pub fn to_bytes(&self) -> [u8; NONCE_COMMITMENT_LENGTH] {
        self.0.to_bytes()
    }

    /// Construct a `NonceCommitment` from a slice of bytes.
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<NonceCommitment> {
        Ok(NonceCommitment(decode_point(bytes, "NonceCommitment", NonceCommitment::DESCRIPTION)?))
    }
}

serde_boilerplate!(NonceCommitment);

/// One signer's `ν` secret nonces for one session, along with their
/// public commitments.
///
/// Consumed by signing.  Never persist these across sessions.
pub struct SigningNonces {
    nonces: Vec<Nonce>,
    commitments: Vec<NonceCommitment>,
}

impl SigningNonces {
    /// Generate `ν` fresh nonces for `secret` from the `csprng`.
    pub fn generate_with<R>(config: &ProtocolConfig, secret: &SecretKey, mut csprng: R) -> SigningNonces
    where R: RngCore + CryptoRng,
    {
        let nonces: Vec<Nonce> = (0..config.nonce_multiplicity())
            .map(|j| Nonce::new(secret, j, &mut csprng))
            .collect();
        let commitments = nonces.iter().map(Nonce::commitment).collect();
        SigningNonces { nonces, commitments }
    }

    /// Generate `ν` fresh nonces for `secret` using operating system randomness.
    pub fn generate(config: &ProtocolConfig, secret: &SecretKey) -> SigningNonces {
        Self::generate_with(config, secret, crate::getrandom_or_panic())
    }

    /// The commitments to broadcast in the first round.
    pub fn commitments(&self) -> &[NonceCommitment] {
        &self.commitments
    }

    /// Number of nonces held.
    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    /// Whether no nonces are held.
    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    pub(crate) fn nonces(&self) -> &[Nonce] {
        &self.nonces
    }
}

/// The `n × ν` matrix of nonce commitments of all signers, in key set
/// order, fixed once the first round completes.
///
/// Every party must hold a byte-identical matrix, or they compute
/// different aggregate nonces and the signature fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonceMatrix {
    commitments: Vec<NonceCommitment>,
    width: usize,
}

impl NonceMatrix {
    /// Build a matrix from one row of commitments per signer.
    ///
    /// Rejects an empty matrix, empty rows, and rows of unequal width.
    pub fn new(rows: Vec<Vec<NonceCommitment>>) -> MultiSigResult<NonceMatrix> {
        let width = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            Some(_) => return Err(MultiSigError::ZeroNonceMultiplicity),
            None => return Err(MultiSigError::EmptyNonceMatrix),
        };
        let mut commitments = Vec::with_capacity(rows.len() * width);
        for (row, r) in rows.into_iter().enumerate() {
            if r.len() != width {
                return Err(MultiSigError::NonceMatrixShape { row, expected: width, found: r.len() });
            }
            commitments.extend(r);
        }
        Ok(NonceMatrix { commitments, width })
    }

    /// Number of signers `n`.
    pub fn signers(&self) -> usize {
        self.commitments.len() / self.width
    }

    /// Nonce multiplicity `ν`.
    pub fn nonce_multiplicity(&self) -> usize {
        self.width
    }

    /// Commitments of the signer at `index`.
    pub fn row(&self, index: usize) -> Option<&[NonceCommitment]> {
        let start = index.checked_mul(self.width)?;
        let end = start.checked_add(self.width)?;
        self.commitments.get(start..end)
    }

    /// Iterate over rows in signer order.
    pub fn rows(&self) -> impl Iterator<Item = &[NonceCommitment]> {
        self.commitments.chunks(self.width)
    }

    /// All commitments, flattened in row-major order.
    pub fn as_slice(&self) -> &[NonceCommitment] {
        &self.commitments
    }

    pub(crate) fn check_config(&self, config: &ProtocolConfig) -> MultiSigResult<()> {
        if self.width != config.nonce_multiplicity() {
            return Err(MultiSigError::NonceMatrixShape {
                row: 0,
                expected: config.nonce_multiplicity(),
                found: self.width,
            });
        }
        Ok(())
    }
}

/// The weightings `alpha_{i,j}` of one session, along with the
/// aggregate nonce `R` they produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonceCoefficients {
    alphas: Vec<Scalar>,
    width: usize,
    pub(crate) aggregate: RistrettoBoth,
}

impl NonceCoefficients {
    /// Compute every weighting and the aggregate nonce of a session.
    pub fn compute(
        config: &ProtocolConfig,
        message: &[u8],
        matrix: &NonceMatrix,
        aggregate_key: &AggregatePublicKey,
    ) -> MultiSigResult<NonceCoefficients> {
        matrix.check_config(config)?;
        let alphas = match config.binding() {
            BindingMode::FiatShamir => fiat_shamir_coefficients(message, matrix, aggregate_key),
            BindingMode::PlainSum => vec![Scalar::ONE; matrix.as_slice().len()],
            BindingMode::MuSig2 => musig2_coefficients(message, matrix, aggregate_key),
        };
        // Public inputs only, so variable time is fine.
        let r = RistrettoPoint::vartime_multiscalar_mul(
            alphas.iter(),
            matrix.as_slice().iter().map(|c| c.as_point()),
        );
        debug!(
            signers = matrix.signers(),
            nonce_multiplicity = matrix.nonce_multiplicity(),
            binding = ?config.binding(),
            "aggregated nonce commitments"
        );
        Ok(NonceCoefficients { alphas, width: matrix.nonce_multiplicity(), aggregate: RistrettoBoth::from_point(r) })
    }

    /// Weightings `alpha_{i,1}..alpha_{i,ν}` of the signer at `index`.
    pub fn row(&self, index: usize) -> Option<&[Scalar]> {
        let start = index.checked_mul(self.width)?;
        let end = start.checked_add(self.width)?;
        self.alphas.get(start..end)
    }

    /// The aggregate nonce `R`.
    pub fn aggregate(&self) -> &RistrettoPoint {
        self.aggregate.as_point()
    }

    /// The aggregate nonce `R`, compressed as it appears in signatures.
    pub fn aggregate_compressed(&self) -> &CompressedRistretto {
        self.aggregate.as_compressed()
    }
}

/// `alpha_{i,j} = H(X, n, ν, R_{1,1}..R_{n,ν}, m, i, j)`.
///
/// We absorb the shared prefix once and clone it for every `(i, j)`,
/// so each weighting still commits to the whole matrix.
fn fiat_shamir_coefficients(
    message: &[u8],
    matrix: &NonceMatrix,
    aggregate_key: &AggregatePublicKey,
) -> Vec<Scalar> {
    let mut t = Transcript::new(NONCE_COEFFICIENT_LABEL);
    t.commit_point(b"X", aggregate_key.as_compressed());
    t.commit_index(b"n", matrix.signers() as u64);
    t.commit_index(b"nu", matrix.nonce_multiplicity() as u64);
    for c in matrix.as_slice() {
        t.commit_point(b"R", c.as_compressed());
    }
    t.commit_bytes(b"m", message);

    let mut alphas = Vec::with_capacity(matrix.as_slice().len());
    for i in 0..matrix.signers() {
        for j in 0..matrix.nonce_multiplicity() {
            let mut tij = t.clone();
            tij.commit_index(b"i", i as u64);
            tij.commit_index(b"j", j as u64);
            alphas.push(tij.challenge_scalar(b"alpha"));
        }
    }
    alphas
}

/// `alpha_{i,j} = b^j` with `b = H(X, ν, R_1..R_ν, m)` over the column
/// sums `R_j = Σ_i R_{i,j}`.
fn musig2_coefficients(
    message: &[u8],
    matrix: &NonceMatrix,
    aggregate_key: &AggregatePublicKey,
) -> Vec<Scalar> {
    let width = matrix.nonce_multiplicity();
    let mut columns = vec![RistrettoPoint::default(); width];
    for row in matrix.rows() {
        for (column, c) in columns.iter_mut().zip(row) {
            *column += c.as_point();
        }
    }

    let mut t = Transcript::new(MUSIG2_COEFFICIENT_LABEL);
    t.commit_point(b"X", aggregate_key.as_compressed());
    t.commit_index(b"nu", width as u64);
    for column in columns.iter() {
        t.commit_point(b"R", &column.compress());
    }
    t.commit_bytes(b"m", message);
    let b = t.challenge_scalar(b"b");

    let mut powers = Vec::with_capacity(width);
    let mut power = Scalar::ONE;
    for _ in 0..width {
        powers.push(power);
        power *= b;
    }
    (0..matrix.signers()).flat_map(|_| powers.iter().copied()).collect()
}

/// Aggregate nonce `R = Σ_i Σ_j alpha_{i,j} R_{i,j}` of a session.
pub fn aggregate_nonces(
    config: &ProtocolConfig,
    message: &[u8],
    matrix: &NonceMatrix,
    aggregate_key: &AggregatePublicKey,
) -> MultiSigResult<RistrettoPoint> {
    Ok(*NonceCoefficients::compute(config, message, matrix, aggregate_key)?.aggregate())
}
