// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Aggregation of public keys, following the key aggregation of
//! "Simple Schnorr Multi-Signatures with Applications to Bitcoin" by
//! Gregory Maxwell, Andrew Poelstra, Yannick Seurin, and Pieter Wuille
//! https://eprint.iacr.org/2018/068
//!
//! We first hash the ordered key set into a digest `L`, and then
//! weight every public key `P_i` by `a_i = H(L, P_i)`, so the aggregate
//! `X = Σ a_i P_i` depends upon every key in the set.  An attacker
//! therefore cannot choose their key as a function of the honest keys
//! to cancel them out of `X`, aka a rogue-key attack.
//!
//! All parties and the verifier must supply the keys in the same order,
//! because the order is hashed into `L`.

use alloc::vec::Vec;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use merlin::Transcript;
use tracing::debug;

use crate::context::{SigningTranscript, KEY_COEFFICIENT_LABEL, KEY_SET_LABEL};
use crate::errors::{MultiSigError, MultiSigResult};
use crate::keys::PublicKey;

/// The length of a `KeySetDigest`, in bytes.
pub const KEY_SET_DIGEST_LENGTH: usize = 32;

/// Digest `L` of an ordered key set, which domain separates every
/// key weighting for that set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeySetDigest(pub(crate) [u8; KEY_SET_DIGEST_LENGTH]);

impl KeySetDigest {
    /// Hash the key count and every compressed key in order.
    pub fn compute(public_keys: &[PublicKey]) -> KeySetDigest {
        let mut t = Transcript::new(KEY_SET_LABEL);
        t.commit_index(b"n", public_keys.len() as u64);
        for pk in public_keys {
            t.commit_point(b"pk", pk.as_compressed());
        }
        let mut digest = [0u8; KEY_SET_DIGEST_LENGTH];
        t.challenge_bytes(b"L", &mut digest);
        KeySetDigest(digest)
    }

    /// Weighting `a = H(L, P)` for one public key of this key set.
    ///
    /// We cannot verify that the public key belongs to the key set here,
    /// so `KeyAggregation::coefficient` should be preferred.
    pub fn coefficient(&self, public_key: &PublicKey) -> Scalar {
        let mut t = Transcript::new(KEY_COEFFICIENT_LABEL);
        t.commit_bytes(b"L", &self.0[..]);
        t.commit_point(b"pk", public_key.as_compressed());
        t.challenge_scalar(b"a")
    }

    /// View this digest as bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SET_DIGEST_LENGTH] {
        &self.0
    }

    /// Convert this digest to a byte array.
    pub fn to_bytes(&self) -> [u8; KEY_SET_DIGEST_LENGTH] {
        self.0
    }
}

/// Aggregate public key `X = Σ a_i P_i` of a key set, against which
/// the final signature verifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AggregatePublicKey(pub(crate) PublicKey);

impl AggregatePublicKey {
    /// The aggregate key as an ordinary `PublicKey`.
    pub fn public_key(&self) -> &PublicKey {
        &self.0
    }

    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        self.0.as_compressed()
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        self.0.as_point()
    }

    /// Convert the aggregate key to a byte array.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

/// Aggregate `L` and `X` of an ordered key set, given as
/// `(KeySetDigest, AggregatePublicKey)`.
///
/// Returns `EmptyKeySet` for an empty slice, which has no aggregate.
pub fn aggregate_public_keys(public_keys: &[PublicKey])
 -> MultiSigResult<(KeySetDigest, AggregatePublicKey)>
{
    let agg = KeyAggregation::new(public_keys)?;
    Ok((agg.digest, agg.aggregate))
}

/// The fixed key set of one signing session, together with its digest
/// `L`, every key weighting `a_i`, and the aggregate key `X`.
///
/// Corresponds to the `KeysKnown` stage of a session.  Nothing here is
/// secret, so the same value may be shared by cosigners and verifiers.
#[derive(Clone, Debug)]
pub struct KeyAggregation {
    public_keys: Vec<PublicKey>,
    coefficients: Vec<Scalar>,
    digest: KeySetDigest,
    aggregate: AggregatePublicKey,
}

impl KeyAggregation {
    /// Aggregate an ordered, non-empty key set.
    ///
    /// Duplicate keys are permitted, with each occurrence weighted
    /// separately, but they hold no advantage for anyone.
    pub fn new(public_keys: &[PublicKey]) -> MultiSigResult<KeyAggregation> {
        if public_keys.is_empty() {
            return Err(MultiSigError::EmptyKeySet);
        }
        let digest = KeySetDigest::compute(public_keys);
        let coefficients: Vec<Scalar> = public_keys.iter()
            .map(|pk| digest.coefficient(pk))
            .collect();
        // Public inputs only, so variable time is fine.
        let point = RistrettoPoint::vartime_multiscalar_mul(
            coefficients.iter(),
            public_keys.iter().map(|pk| pk.as_point()),
        );
        debug!(signers = public_keys.len(), "aggregated public keys");
        Ok(KeyAggregation {
            public_keys: public_keys.to_vec(),
            coefficients,
            digest,
            aggregate: AggregatePublicKey(PublicKey::from_point(point)),
        })
    }

    /// Number of signers `n`.
    pub fn len(&self) -> usize {
        self.public_keys.len()
    }

    /// Always false, since empty key sets are rejected.
    pub fn is_empty(&self) -> bool {
        self.public_keys.is_empty()
    }

    /// The ordered key set.
    pub fn public_keys(&self) -> &[PublicKey] {
        &self.public_keys
    }

    /// The key set digest `L`.
    pub fn digest(&self) -> &KeySetDigest {
        &self.digest
    }

    /// The aggregate public key `X`.
    pub fn aggregate(&self) -> &AggregatePublicKey {
        &self.aggregate
    }

    /// Key weighting `a_i` of the signer at `index`.
    pub fn coefficient_at(&self, index: usize) -> Option<Scalar> {
        self.coefficients.get(index).copied()
    }

    /// Key weighting of a public key, or `None` if it is not in the key set.
    pub fn coefficient(&self, choice: &PublicKey) -> Option<Scalar> {
        self.public_keys.iter()
            .position(|pk| pk == choice)
            .map(|i| self.coefficients[i])
    }
}
