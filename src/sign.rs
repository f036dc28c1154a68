// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! ### Partial signature creation, aggregation, and verification.
//!
//! Signers holding the same aggregate key `X`, aggregate nonce `R` and
//! message each produce `s_i = Σ_j alpha_{i,j} r_{i,j} + c a_i x_i`
//! where `c = H(X, R, m)`.  The sum `S = Σ_i s_i` then satisfies the
//! ordinary Schnorr equation `S B = R + c X`.

use core::fmt::Debug;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::VartimeMultiscalarMul;
use merlin::Transcript;
use tracing::debug;

use crate::aggregation::{aggregate_public_keys, AggregatePublicKey, KeySetDigest};
use crate::config::ProtocolConfig;
use crate::context::{SigningTranscript, CHALLENGE_LABEL};
use crate::errors::{MultiSigError, MultiSigResult};
use crate::keys::{Keypair, PublicKey, SecretKey};
use crate::nonces::{NonceCoefficients, NonceCommitment, NonceMatrix, SigningNonces};
use crate::points::{decode_point, decode_scalar, RistrettoBoth, RISTRETTO_POINT_LENGTH, SCALAR_LENGTH};

// === Signature types === //

/// The length of an aggregate `Signature`, in bytes.
pub const SIGNATURE_LENGTH: usize = RISTRETTO_POINT_LENGTH + SCALAR_LENGTH;

/// The length of a `PartialSignature`, in bytes.
pub const PARTIAL_SIGNATURE_LENGTH: usize = SCALAR_LENGTH;

/// An aggregate Schnorr signature "detached" from the signed message.
///
/// Indistinguishable from a single signer Schnorr signature by the
/// aggregate public key `X`, except that it must be verified against
/// the ordered key set from which `X` was aggregated.
#[allow(non_snake_case)]
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Signature {
    /// `R = Σ_i Σ_j alpha_{i,j} R_{i,j}` is the aggregate nonce of the
    /// signing session.
    pub(crate) R: RistrettoBoth,

    /// `S = Σ_i s_i` is the sum of every signer's partial signature.
    pub(crate) s: Scalar,
}

impl Debug for Signature {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "Signature( R: {:?}, s: {:?} )", self.R.as_compressed(), &self.s)
    }
}

impl Signature {
    const DESCRIPTION: &'static str = "A 64 byte Ristretto Schnorr multi-signature";

    /// The aggregate nonce `R`.
    pub fn nonce(&self) -> &CompressedRistretto {
        self.R.as_compressed()
    }

    /// The aggregate response scalar `S`.
    pub fn response(&self) -> &Scalar {
        &self.s
    }

    /// Convert this `Signature` to a byte array, `R` followed by `S`.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut bytes: [u8; SIGNATURE_LENGTH] = [0u8; SIGNATURE_LENGTH];
        bytes[..RISTRETTO_POINT_LENGTH].copy_from_slice(&self.R.to_bytes());
        bytes[RISTRETTO_POINT_LENGTH..].copy_from_slice(self.s.as_bytes());
        bytes
    }

    /// Construct a `Signature` from a slice of bytes.
    ///
    /// We reject any `R` that fails to decompress and any `S` that is
    /// not canonically reduced, so every accepted encoding is unique.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<Signature> {
        if bytes.len() != SIGNATURE_LENGTH {
            return Err(MultiSigError::BytesLengthError {
                name: "Signature",
                description: Signature::DESCRIPTION,
                length: SIGNATURE_LENGTH,
            });
        }
        let R = decode_point(&bytes[..RISTRETTO_POINT_LENGTH], "Signature", Signature::DESCRIPTION)?;
        let s = decode_scalar(&bytes[RISTRETTO_POINT_LENGTH..], "Signature", Signature::DESCRIPTION)?;
        Ok(Signature { R, s })
    }
}

serde_boilerplate!(Signature);

/// One signer's contribution `s_i` to an aggregate signature.
///
/// Safe to broadcast once produced.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PartialSignature(pub(crate) Scalar);

impl PartialSignature {
    const DESCRIPTION: &'static str = "A partial signature as a 32 byte canonical scalar";

    /// The scalar `s_i`.
    pub fn as_scalar(&self) -> &Scalar {
        &self.0
    }

    /// Convert this partial signature to a byte array.
    pub fn to_bytes(&self) -> [u8; PARTIAL_SIGNATURE_LENGTH] {
        self.0.to_bytes()
    }

    /// Construct a `PartialSignature` from a canonically encoded scalar.
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<PartialSignature> {
        Ok(PartialSignature(decode_scalar(bytes, "PartialSignature", PartialSignature::DESCRIPTION)?))
    }
}

serde_boilerplate!(PartialSignature);

// === Protocol operations === //

/// Fiat-Shamir challenge `c = H(X, R, m)`.
///
/// Signers and verifiers must agree upon this exactly, so it depends
/// only upon the compressed encodings of `X` and `R`.
pub fn challenge(aggregate_key: &AggregatePublicKey, nonce: &CompressedRistretto, message: &[u8]) -> Scalar {
    let mut t = Transcript::new(CHALLENGE_LABEL);
    t.commit_point(b"X", aggregate_key.as_compressed());
    t.commit_point(b"R", nonce);
    t.commit_bytes(b"m", message);
    t.challenge_scalar(b"c")
}

/// Compute `s_i` from one signer's weightings and its consumed nonces.
///
/// We check the nonces against the signer's row of the nonce matrix, so
/// that nonces from some other session cannot silently sign here.
pub(crate) fn sign_row(
    index: usize,
    secret: &SecretKey,
    key_coefficient: &Scalar,
    nonces: SigningNonces,
    row: &[NonceCommitment],
    alphas: &[Scalar],
    challenge: &Scalar,
) -> MultiSigResult<PartialSignature> {
    if nonces.len() != alphas.len() {
        return Err(MultiSigError::NonceCountMismatch { expected: alphas.len(), found: nonces.len() });
    }
    if nonces.commitments() != row {
        return Err(MultiSigError::NonceCommitmentMismatch { index });
    }
    let mut s = challenge * key_coefficient * secret.key;
    for (alpha, nonce) in alphas.iter().zip(nonces.nonces()) {
        s += alpha * nonce.0;
    }
    debug!(index, "produced partial signature");
    // `nonces` drops here, which zeros every secret nonce.
    Ok(PartialSignature(s))
}

/// Produce the partial signature `s_i` of the signer at `index`.
///
/// Here `nonce` must be the aggregate nonce `R` of `matrix`, as returned
/// by `aggregate_nonces`, and `aggregate_key` and `digest` must come from
/// the key set of the session.  We consume `nonces`, so they cannot sign
/// a second time.
///
/// `SigningSession::partial_sign` performs the same operation while
/// sharing the session computations between signers.
#[allow(clippy::too_many_arguments)]
pub fn partial_sign(
    config: &ProtocolConfig,
    index: usize,
    message: &[u8],
    keypair: &Keypair,
    nonces: SigningNonces,
    nonce: &CompressedRistretto,
    matrix: &NonceMatrix,
    aggregate_key: &AggregatePublicKey,
    digest: &KeySetDigest,
) -> MultiSigResult<PartialSignature> {
    let signers = matrix.signers();
    let row = matrix.row(index).ok_or(MultiSigError::SignerIndexOutOfRange { index, signers })?;
    if nonces.len() != config.nonce_multiplicity() {
        return Err(MultiSigError::NonceCountMismatch {
            expected: config.nonce_multiplicity(),
            found: nonces.len(),
        });
    }
    let coefficients = NonceCoefficients::compute(config, message, matrix, aggregate_key)?;
    let alphas = coefficients.row(index).ok_or(MultiSigError::SignerIndexOutOfRange { index, signers })?;
    let c = challenge(aggregate_key, nonce, message);
    let a = digest.coefficient(&keypair.public);
    sign_row(index, &keypair.secret, &a, nonces, row, alphas, &c)
}

/// Check one partial signature: `s_i B = Σ_j alpha_{i,j} R_{i,j} + c a_i P_i`.
pub(crate) fn verify_row(
    partial: &PartialSignature,
    public_key: &PublicKey,
    key_coefficient: &Scalar,
    row: &[NonceCommitment],
    alphas: &[Scalar],
    challenge: &Scalar,
) -> bool {
    let scalars = alphas.iter().copied().chain(Some(challenge * key_coefficient));
    let points = row.iter().map(|c| *c.as_point()).chain(Some(*public_key.as_point()));
    let expected = RistrettoPoint::vartime_multiscalar_mul(scalars, points);
    RistrettoPoint::mul_base(&partial.0) == expected
}

/// Sum partial signatures into the aggregate response `S = Σ_i s_i`.
///
/// The order of `partials` does not matter.
pub fn aggregate_partial_signatures(partials: &[PartialSignature]) -> MultiSigResult<Scalar> {
    if partials.is_empty() {
        return Err(MultiSigError::NoPartialSignatures);
    }
    debug!(partials = partials.len(), "aggregated partial signatures");
    Ok(partials.iter().map(|p| p.0).sum())
}

/// Verify a signature against an aggregate public key already computed
/// by `aggregate_public_keys`.
#[allow(non_snake_case)]
pub fn verify_aggregate(message: &[u8], signature: &Signature, aggregate_key: &AggregatePublicKey) -> bool {
    let X: &RistrettoPoint = aggregate_key.as_point();
    let c = challenge(aggregate_key, signature.R.as_compressed(), message);
    let R = RistrettoPoint::vartime_double_scalar_mul_basepoint(&c, &(-X), &signature.s);
    let valid = R.compress() == *signature.R.as_compressed();
    debug!(valid, "verified multi-signature");
    valid
}

/// Verify a signature on `message` by the ordered key set `public_keys`.
///
/// Returns `Ok(false)` for a signature that fails the verification
/// equation, and an error only for an empty key set.
pub fn verify(message: &[u8], signature: &Signature, public_keys: &[PublicKey]) -> MultiSigResult<bool> {
    let (_, aggregate_key) = aggregate_public_keys(public_keys)?;
    Ok(verify_aggregate(message, signature, &aggregate_key))
}

#[cfg(test)]
mod test {
    use alloc::vec::Vec;

    use super::*;
    use crate::nonces::aggregate_nonces;

    struct Fixture {
        config: ProtocolConfig,
        keypairs: Vec<Keypair>,
        public_keys: Vec<PublicKey>,
        matrix: NonceMatrix,
        nonces: Vec<SigningNonces>,
        digest: KeySetDigest,
        aggregate_key: AggregatePublicKey,
    }

    fn fixture(n: usize, config: ProtocolConfig) -> Fixture {
        let keypairs: Vec<Keypair> = (0..n).map(|_| Keypair::generate()).collect();
        let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
        let (digest, aggregate_key) = aggregate_public_keys(&public_keys).unwrap();
        let nonces: Vec<SigningNonces> = keypairs.iter()
            .map(|k| SigningNonces::generate(&config, &k.secret))
            .collect();
        let matrix = NonceMatrix::new(nonces.iter().map(|n| n.commitments().to_vec()).collect()).unwrap();
        Fixture { config, keypairs, public_keys, matrix, nonces, digest, aggregate_key }
    }

    fn sign_all(f: Fixture, message: &[u8]) -> (Vec<PartialSignature>, Signature, Vec<PublicKey>) {
        let r = aggregate_nonces(&f.config, message, &f.matrix, &f.aggregate_key).unwrap().compress();
        let partials: Vec<PartialSignature> = f.keypairs.iter().zip(f.nonces)
            .enumerate()
            .map(|(i, (k, n))| partial_sign(
                &f.config, i, message, k, n, &r, &f.matrix, &f.aggregate_key, &f.digest
            ).unwrap())
            .collect();
        let s = aggregate_partial_signatures(&partials).unwrap();
        let signature = Signature { R: RistrettoBoth::from_compressed(r).unwrap(), s };
        (partials, signature, f.public_keys)
    }

    #[test]
    fn sign_verify() {
        let message: &[u8] = b"Send 100 DOT to Alice";
        let (_, signature, public_keys) = sign_all(fixture(3, ProtocolConfig::default()), message);
        assert!(verify(message, &signature, &public_keys).unwrap());
        assert!(!verify(b"Send 100 DOT to Mallory", &signature, &public_keys).unwrap());
    }

    #[test]
    fn verify_rejects_reordered_key_set() {
        let message: &[u8] = b"order matters";
        let (_, signature, mut public_keys) = sign_all(fixture(3, ProtocolConfig::default()), message);
        public_keys.swap(0, 1);
        assert!(!verify(message, &signature, &public_keys).unwrap());
    }

    #[test]
    fn verify_rejects_empty_key_set() {
        let message: &[u8] = b"nobody";
        let (_, signature, _) = sign_all(fixture(1, ProtocolConfig::default()), message);
        assert_eq!(verify(message, &signature, &[]), Err(MultiSigError::EmptyKeySet));
    }

    #[test]
    fn aggregation_is_commutative() {
        let message: &[u8] = b"commutative";
        let (mut partials, signature, public_keys) = sign_all(fixture(4, ProtocolConfig::default()), message);
        partials.reverse();
        partials.swap(1, 2);
        let s = aggregate_partial_signatures(&partials).unwrap();
        assert_eq!(s, signature.s);
        assert!(verify(message, &Signature { R: signature.R, s }, &public_keys).unwrap());
    }

    #[test]
    fn aggregation_requires_partials() {
        assert_eq!(aggregate_partial_signatures(&[]), Err(MultiSigError::NoPartialSignatures));
    }

    #[test]
    fn missing_partial_fails_verification() {
        let message: &[u8] = b"everyone must sign";
        let (partials, signature, public_keys) = sign_all(fixture(3, ProtocolConfig::default()), message);
        let s = aggregate_partial_signatures(&partials[1..]).unwrap();
        assert!(!verify(message, &Signature { R: signature.R, s }, &public_keys).unwrap());
    }

    #[test]
    fn partial_sign_rejects_bad_index() {
        let f = fixture(2, ProtocolConfig::default());
        let message: &[u8] = b"index";
        let r = aggregate_nonces(&f.config, message, &f.matrix, &f.aggregate_key).unwrap().compress();
        let mut nonces = f.nonces;
        let n = nonces.pop().unwrap();
        assert_eq!(
            partial_sign(&f.config, 2, message, &f.keypairs[1], n, &r, &f.matrix, &f.aggregate_key, &f.digest),
            Err(MultiSigError::SignerIndexOutOfRange { index: 2, signers: 2 })
        );
    }

    #[test]
    fn partial_sign_rejects_huge_index() {
        let f = fixture(2, ProtocolConfig::default());
        let message: &[u8] = b"huge index";
        let r = aggregate_nonces(&f.config, message, &f.matrix, &f.aggregate_key).unwrap().compress();
        let mut nonces = f.nonces;
        for index in [usize::MAX / 2, usize::MAX] {
            let n = nonces.pop().unwrap();
            let err = partial_sign(
                &f.config, index, message, &f.keypairs[0], n, &r, &f.matrix, &f.aggregate_key, &f.digest
            ).unwrap_err();
            assert_eq!(err, MultiSigError::SignerIndexOutOfRange { index, signers: 2 });
            assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn partial_sign_rejects_foreign_nonces() {
        let f = fixture(2, ProtocolConfig::default());
        let message: &[u8] = b"nonces";
        let r = aggregate_nonces(&f.config, message, &f.matrix, &f.aggregate_key).unwrap().compress();
        let mut nonces = f.nonces;
        let n1 = nonces.pop().unwrap();
        // Signer 1's nonces presented as signer 0's row.
        assert_eq!(
            partial_sign(&f.config, 0, message, &f.keypairs[0], n1, &r, &f.matrix, &f.aggregate_key, &f.digest),
            Err(MultiSigError::NonceCommitmentMismatch { index: 0 })
        );
        let wrong = SigningNonces::generate(&ProtocolConfig::fiat_shamir(3).unwrap(), &f.keypairs[0].secret);
        assert_eq!(
            partial_sign(&f.config, 0, message, &f.keypairs[0], wrong, &r, &f.matrix, &f.aggregate_key, &f.digest),
            Err(MultiSigError::NonceCountMismatch { expected: 2, found: 3 })
        );
    }

    #[test]
    fn partial_signatures_verify_individually() {
        let f = fixture(3, ProtocolConfig::default());
        let message: &[u8] = b"individually";
        let config = f.config;
        let matrix = f.matrix.clone();
        let aggregate_key = f.aggregate_key;
        let digest = f.digest;
        let (partials, signature, public_keys) = sign_all(f, message);

        let coefficients = NonceCoefficients::compute(&config, message, &matrix, &aggregate_key).unwrap();
        let c = challenge(&aggregate_key, signature.nonce(), message);
        for (i, (p, pk)) in partials.iter().zip(&public_keys).enumerate() {
            let a = digest.coefficient(pk);
            let row = matrix.row(i).unwrap();
            assert!(verify_row(p, pk, &a, row, coefficients.row(i).unwrap(), &c));
            let forged = PartialSignature(p.0 + Scalar::ONE);
            assert!(!verify_row(&forged, pk, &a, row, coefficients.row(i).unwrap(), &c));
        }
    }

    #[test]
    fn signature_bytes_round_trip() {
        let message: &[u8] = b"bytes";
        let (partials, signature, _) = sign_all(fixture(2, ProtocolConfig::default()), message);
        let bytes = signature.to_bytes();
        assert_eq!(bytes.len(), SIGNATURE_LENGTH);
        assert_eq!(Signature::from_bytes(&bytes), Ok(signature));
        assert_eq!(PartialSignature::from_bytes(&partials[0].to_bytes()), Ok(partials[0]));
    }

    #[test]
    fn signature_rejects_malformed_bytes() {
        let message: &[u8] = b"malformed";
        let (_, signature, _) = sign_all(fixture(2, ProtocolConfig::default()), message);
        let bytes = signature.to_bytes();

        let short = Signature::from_bytes(&bytes[..63]).unwrap_err();
        assert_eq!(short.kind(), crate::ErrorKind::MalformedEncoding);

        let mut bad_point = bytes;
        bad_point[..32].copy_from_slice(&[0xffu8; 32]);
        assert_eq!(Signature::from_bytes(&bad_point), Err(MultiSigError::PointDecompressionError));

        let mut bad_scalar = bytes;
        bad_scalar[32..].copy_from_slice(&[0xffu8; 32]);
        assert_eq!(Signature::from_bytes(&bad_scalar), Err(MultiSigError::ScalarFormatError));
    }

    #[test]
    fn challenge_is_deterministic() {
        let f = fixture(2, ProtocolConfig::default());
        let r = f.matrix.row(0).unwrap()[0].as_compressed();
        assert_eq!(challenge(&f.aggregate_key, r, b"m"), challenge(&f.aggregate_key, r, b"m"));
        assert_ne!(challenge(&f.aggregate_key, r, b"m"), challenge(&f.aggregate_key, r, b"n"));
    }
}
