// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Signing sessions which enforce the ordering of the protocol.
//!
//! A session passes through the stages
//! `KeysKnown → NoncesExchanged → ChallengeFixed → PartiallySigned(i)
//! → Aggregated → Verified`.  We encode the ordering in the types:
//! a `SigningSession` exists only once a `KeyAggregation` and a complete
//! `NonceMatrix` with one row per key are available, and only a
//! `SigningSession` offers `partial_sign`.  No signer can therefore sign
//! before every nonce commitment is fixed, which is the classic failure
//! of two round multi-signatures.
//!
//! A `SigningSession` is immutable once built, and computes the nonce
//! weightings, `R` and `c` exactly once.  Cosigners in one process may
//! share a `&SigningSession` across threads.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use tracing::{debug, warn};

use crate::aggregation::KeyAggregation;
use crate::config::ProtocolConfig;
use crate::errors::{MultiSigError, MultiSigResult};
use crate::keys::Keypair;
use crate::nonces::{NonceCoefficients, NonceMatrix, SigningNonces};
use crate::sign::{
    aggregate_partial_signatures, challenge, sign_row, verify_aggregate, verify_row,
    PartialSignature, Signature,
};

/// Stages of one signing session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SessionStage {
    /// The ordered key set and aggregate key are fixed.
    KeysKnown,
    /// Every signer's nonce commitments are collected.
    NoncesExchanged,
    /// Nonce weightings, `R` and `c` are computed.
    ChallengeFixed,
    /// The signer at this index produced its partial signature.
    PartiallySigned(usize),
    /// Partial signatures were summed into a `Signature`.
    Aggregated,
    /// The final signature was checked, with this outcome.
    Verified(bool),
}

/// Receives every stage transition of a `SigningSession`, for example
/// to time each stage.
pub trait SessionObserver {
    /// Called upon entering `stage`.
    fn observe(&self, stage: SessionStage);
}

/// A signing session whose key set, nonce matrix and message are fixed.
pub struct SigningSession {
    config: ProtocolConfig,
    keys: KeyAggregation,
    matrix: NonceMatrix,
    message: Vec<u8>,
    coefficients: NonceCoefficients,
    challenge: Scalar,
    observer: Option<Box<dyn SessionObserver + Send + Sync>>,
}

impl Debug for SigningSession {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        f.debug_struct("SigningSession")
            .field("config", &self.config)
            .field("keys", &self.keys)
            .field("matrix", &self.matrix)
            .field("R", self.aggregate_nonce())
            .finish()
    }
}

impl SigningSession {
    /// Fix a session from its key set, complete nonce matrix and message.
    ///
    /// Fails unless the matrix has exactly one row per key, each of
    /// width `ν`.
    pub fn new(
        config: ProtocolConfig,
        keys: KeyAggregation,
        matrix: NonceMatrix,
        message: &[u8],
    ) -> MultiSigResult<SigningSession> {
        SigningSession::build(config, keys, matrix, message, None)
    }

    /// Fix a session as in `new`, reporting every stage to `observer`.
    pub fn with_observer(
        config: ProtocolConfig,
        keys: KeyAggregation,
        matrix: NonceMatrix,
        message: &[u8],
        observer: Box<dyn SessionObserver + Send + Sync>,
    ) -> MultiSigResult<SigningSession> {
        SigningSession::build(config, keys, matrix, message, Some(observer))
    }

    fn build(
        config: ProtocolConfig,
        keys: KeyAggregation,
        matrix: NonceMatrix,
        message: &[u8],
        observer: Option<Box<dyn SessionObserver + Send + Sync>>,
    ) -> MultiSigResult<SigningSession> {
        let observe = |stage| if let Some(o) = observer.as_ref() { o.observe(stage) };
        observe(SessionStage::KeysKnown);
        if matrix.signers() != keys.len() {
            return Err(MultiSigError::SignerCountMismatch { keys: keys.len(), rows: matrix.signers() });
        }
        observe(SessionStage::NoncesExchanged);
        let coefficients = NonceCoefficients::compute(&config, message, &matrix, keys.aggregate())?;
        let challenge = challenge(keys.aggregate(), coefficients.aggregate_compressed(), message);
        observe(SessionStage::ChallengeFixed);
        debug!(signers = keys.len(), "fixed signing session");
        Ok(SigningSession {
            config,
            keys,
            matrix,
            message: message.to_vec(),
            coefficients,
            challenge,
            observer,
        })
    }

    fn observe(&self, stage: SessionStage) {
        if let Some(o) = self.observer.as_ref() {
            o.observe(stage);
        }
    }

    /// The protocol configuration of this session.
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// The key set, with its digest and aggregate key.
    pub fn keys(&self) -> &KeyAggregation {
        &self.keys
    }

    /// The nonce matrix.
    pub fn matrix(&self) -> &NonceMatrix {
        &self.matrix
    }

    /// The message being signed.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Every nonce weighting `alpha_{i,j}` of this session.
    pub fn coefficients(&self) -> &NonceCoefficients {
        &self.coefficients
    }

    /// The aggregate nonce `R`.
    pub fn aggregate_nonce(&self) -> &CompressedRistretto {
        self.coefficients.aggregate_compressed()
    }

    /// The challenge `c = H(X, R, m)`.
    pub fn challenge(&self) -> &Scalar {
        &self.challenge
    }

    /// Produce the partial signature of the signer at `index`, consuming
    /// its nonces.
    ///
    /// Fails if `keypair` is not the key at `index`, or if `nonces` are
    /// not the ones committed in row `index` of the matrix.
    pub fn partial_sign(
        &self,
        index: usize,
        keypair: &Keypair,
        nonces: SigningNonces,
    ) -> MultiSigResult<PartialSignature> {
        let signers = self.keys.len();
        let out_of_range = MultiSigError::SignerIndexOutOfRange { index, signers };
        let public_key = self.keys.public_keys().get(index).ok_or(out_of_range)?;
        if *public_key != keypair.public {
            return Err(MultiSigError::SignerKeyMismatch { index });
        }
        let a = self.keys.coefficient_at(index).ok_or(out_of_range)?;
        let row = self.matrix.row(index).ok_or(out_of_range)?;
        let alphas = self.coefficients.row(index).ok_or(out_of_range)?;
        let partial = sign_row(index, &keypair.secret, &a, nonces, row, alphas, &self.challenge)?;
        self.observe(SessionStage::PartiallySigned(index));
        Ok(partial)
    }

    /// Check the partial signature of the signer at `index`.
    pub fn verify_partial(&self, index: usize, partial: &PartialSignature) -> bool {
        let (Some(public_key), Some(a), Some(row), Some(alphas)) = (
            self.keys.public_keys().get(index),
            self.keys.coefficient_at(index),
            self.matrix.row(index),
            self.coefficients.row(index),
        ) else {
            return false;
        };
        let valid = verify_row(partial, public_key, &a, row, alphas, &self.challenge);
        if !valid {
            warn!(index, "partial signature failed to verify");
        }
        valid
    }

    /// Aggregate one partial signature per signer, given in signer order.
    ///
    /// Every partial signature is checked first, so a bad one is reported
    /// by signer index rather than producing an invalid `Signature`.
    pub fn aggregate(&self, partials: &[PartialSignature]) -> MultiSigResult<Signature> {
        if partials.is_empty() {
            return Err(MultiSigError::NoPartialSignatures);
        }
        if partials.len() != self.keys.len() {
            return Err(MultiSigError::PartialSignatureCountMismatch {
                expected: self.keys.len(),
                found: partials.len(),
            });
        }
        if let Some(index) = (0..partials.len()).find(|&i| !self.verify_partial(i, &partials[i])) {
            return Err(MultiSigError::InvalidPartialSignature { index });
        }
        let s = aggregate_partial_signatures(partials)?;
        self.observe(SessionStage::Aggregated);
        Ok(Signature { R: self.coefficients.aggregate, s })
    }

    /// Verify a signature on this session's message by its key set.
    pub fn verify(&self, signature: &Signature) -> bool {
        let valid = verify_aggregate(&self.message, signature, self.keys.aggregate());
        self.observe(SessionStage::Verified(valid));
        valid
    }
}
