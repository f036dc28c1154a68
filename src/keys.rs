// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Long-term signer keys on the Ristretto group.
//!
//! Each cosigner generates its own independent `Keypair`; there is no
//! distributed key generation here.  The `SecretKey` never leaves its
//! owner, while the `PublicKey` is shared with every cosigner and the
//! verifier, in one agreed order, to form the session's key set.

use core::fmt::Debug;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::{MultiSigError, MultiSigResult};
use crate::points::{decode_point, decode_scalar, RistrettoBoth, RISTRETTO_POINT_LENGTH, SCALAR_LENGTH};

/// The length of a Ristretto Schnorr `PublicKey`, in bytes.
pub const PUBLIC_KEY_LENGTH: usize = RISTRETTO_POINT_LENGTH;

/// The length of a Ristretto Schnorr `SecretKey`, in bytes.
pub const SECRET_KEY_LENGTH: usize = SCALAR_LENGTH;

/// The length of a seed from which `SecretKey::from_seed` expands a key, in bytes.
pub const SEED_LENGTH: usize = 32;

/// The length of a Ristretto Schnorr `Keypair`, in bytes.
pub const KEYPAIR_LENGTH: usize = SECRET_KEY_LENGTH + PUBLIC_KEY_LENGTH;

/// A signer's long-term secret scalar `x`.
///
/// Overwritten with zeros when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    pub(crate) key: Scalar,
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "SecretKey {{ key: <redacted> }}")
    }
}

impl Eq for SecretKey {}
impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).unwrap_u8() == 1u8
    }
}
impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.key.ct_eq(&other.key)
    }
}

impl SecretKey {
    const DESCRIPTION: &'static str = "A Ristretto Schnorr secret key as a 32 byte canonical scalar";

    /// Generate a `SecretKey` from a `csprng`.
    pub fn generate_with<R>(mut csprng: R) -> SecretKey
    where R: CryptoRng + RngCore,
    {
        SecretKey { key: Scalar::random(&mut csprng) }
    }

    /// Generate a `SecretKey` using operating system randomness.
    pub fn generate() -> SecretKey {
        Self::generate_with(crate::getrandom_or_panic())
    }

    /// Expand a 32 byte seed into a `SecretKey` by reducing its
    /// SHA-512 digest modulo the group order.
    ///
    /// Useful for reproducible keys, but the seed is as sensitive as
    /// the key itself.
    pub fn from_seed(seed: &[u8; SEED_LENGTH]) -> SecretKey {
        let mut h = Sha512::new();
        h.update(b"AggSig-secret-from-seed");
        h.update(&seed[..]);
        SecretKey { key: Scalar::from_hash(h) }
    }

    /// Convert this `SecretKey` into an array of 32 bytes.
    #[inline]
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.key.to_bytes()
    }

    /// Construct a `SecretKey` from a canonically encoded scalar.
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<SecretKey> {
        let key = decode_scalar(bytes, "SecretKey", SecretKey::DESCRIPTION)?;
        Ok(SecretKey { key })
    }

    /// Derive the `PublicKey` `x·B` corresponding to this `SecretKey`.
    pub fn to_public(&self) -> PublicKey {
        PublicKey(RistrettoBoth::from_point(RistrettoPoint::mul_base(&self.key)))
    }

    /// Derive the `Keypair` corresponding to this `SecretKey`.
    pub fn to_keypair(self) -> Keypair {
        let public = self.to_public();
        Keypair { secret: self, public }
    }
}

/// A signer's public key `P = x·B`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(pub(crate) RistrettoBoth);

impl PublicKey {
    const DESCRIPTION: &'static str = "A Ristretto Schnorr public key represented as a 32-byte Ristretto compressed point";

    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        self.0.as_compressed()
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        self.0.as_point()
    }

    /// Compress into the `PublicKey` format that also retains the
    /// uncompressed form.
    pub fn from_point(point: RistrettoPoint) -> PublicKey {
        PublicKey(RistrettoBoth::from_point(point))
    }

    /// Decompress into the `PublicKey` format that also retains the
    /// compressed form.
    pub fn from_compressed(compressed: CompressedRistretto) -> MultiSigResult<PublicKey> {
        Ok(PublicKey(RistrettoBoth::from_compressed(compressed)?))
    }

    /// Convert this public key to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Construct a `PublicKey` from a slice of bytes.
    ///
    /// Fails with a malformed-encoding error if the slice is not 32 bytes
    /// long or does not decompress to a Ristretto point.
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<PublicKey> {
        Ok(PublicKey(decode_point(bytes, "PublicKey", PublicKey::DESCRIPTION)?))
    }
}

serde_boilerplate!(PublicKey);

/// A Ristretto Schnorr keypair.
#[derive(Clone, Debug)]
pub struct Keypair {
    /// The secret half of this keypair.
    pub secret: SecretKey,
    /// The public half of this keypair.
    pub public: PublicKey,
}

impl From<SecretKey> for Keypair {
    fn from(secret: SecretKey) -> Keypair {
        secret.to_keypair()
    }
}

impl Keypair {
    const DESCRIPTION: &'static str = "A 64 byte Ristretto Schnorr keypair";

    /// Generate a Ristretto Schnorr `Keypair` from a `csprng`.
    pub fn generate_with<R>(csprng: R) -> Keypair
    where R: CryptoRng + RngCore,
    {
        SecretKey::generate_with(csprng).to_keypair()
    }

    /// Generate a Ristretto Schnorr `Keypair` using operating system randomness.
    pub fn generate() -> Keypair {
        Self::generate_with(crate::getrandom_or_panic())
    }

    /// Serialize `Keypair` to bytes: the secret scalar followed by the
    /// compressed public key.
    pub fn to_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        let mut bytes: [u8; KEYPAIR_LENGTH] = [0u8; KEYPAIR_LENGTH];
        bytes[..SECRET_KEY_LENGTH].copy_from_slice(&self.secret.to_bytes());
        bytes[SECRET_KEY_LENGTH..].copy_from_slice(&self.public.to_bytes());
        bytes
    }

    /// Deserialize a `Keypair` from bytes, checking that the public
    /// half matches the secret half.
    pub fn from_bytes(bytes: &[u8]) -> MultiSigResult<Keypair> {
        if bytes.len() != KEYPAIR_LENGTH {
            return Err(MultiSigError::BytesLengthError {
                name: "Keypair",
                description: Keypair::DESCRIPTION,
                length: KEYPAIR_LENGTH,
            });
        }
        let secret = SecretKey::from_bytes(&bytes[..SECRET_KEY_LENGTH])?;
        let public = PublicKey::from_bytes(&bytes[SECRET_KEY_LENGTH..])?;
        if secret.to_public() != public {
            return Err(MultiSigError::KeypairMismatch);
        }
        Ok(Keypair { secret, public })
    }
}
