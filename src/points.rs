// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Ristretto point tooling
//!
//! We provide a `RistrettoBoth` type that contains both an uncompressed
//! `RistrettoPoint` along side its matching `CompressedRistretto`,
//! which lets key aggregation, nonce aggregation and the challenge hash
//! all reuse one compression of every public value.
//!
//! We also collect the canonical decoding of points and scalars here, so
//! every wire type rejects the same malformed inputs.

use core::fmt::Debug;
use core::hash::{Hash, Hasher};
use core::cmp::Ordering;

use curve25519_dalek::ristretto::{CompressedRistretto, RistrettoPoint};
use curve25519_dalek::scalar::Scalar;

use crate::errors::{MultiSigError, MultiSigResult};

/// The length of a compressed Ristretto point, in bytes.
pub const RISTRETTO_POINT_LENGTH: usize = 32;

/// The length of a canonically encoded scalar, in bytes.
pub const SCALAR_LENGTH: usize = 32;

/// Decompress a 32 byte slice into a point, checking its length.
pub(crate) fn decode_point(
    bytes: &[u8],
    name: &'static str,
    description: &'static str,
) -> MultiSigResult<RistrettoBoth> {
    if bytes.len() != RISTRETTO_POINT_LENGTH {
        return Err(MultiSigError::BytesLengthError { name, description, length: RISTRETTO_POINT_LENGTH });
    }
    let compressed = CompressedRistretto(*array_ref![bytes, 0, 32]);
    RistrettoBoth::from_compressed(compressed)
}

/// Decode a 32 byte slice into a scalar, rejecting any unreduced encoding.
pub(crate) fn decode_scalar(
    bytes: &[u8],
    name: &'static str,
    description: &'static str,
) -> MultiSigResult<Scalar> {
    if bytes.len() != SCALAR_LENGTH {
        return Err(MultiSigError::BytesLengthError { name, description, length: SCALAR_LENGTH });
    }
    Option::<Scalar>::from(Scalar::from_canonical_bytes(*array_ref![bytes, 0, 32]))
        .ok_or(MultiSigError::ScalarFormatError)
}

/// A `RistrettoBoth` contains both an uncompressed `RistrettoPoint`
/// as well as the corresponding `CompressedRistretto`.  It provides
/// a convenient middle ground for protocols that both hash compressed
/// points to derive scalars for use with uncompressed points.
#[derive(Copy, Clone, Eq)]
pub struct RistrettoBoth {
    compressed: CompressedRistretto,
    point: RistrettoPoint,
}

impl Debug for RistrettoBoth {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        write!(f, "RistrettoPoint( {:?} )", self.compressed)
    }
}

impl RistrettoBoth {
    /// Access the compressed Ristretto form
    pub fn as_compressed(&self) -> &CompressedRistretto {
        &self.compressed
    }

    /// Extract the compressed Ristretto form
    pub fn into_compressed(self) -> CompressedRistretto {
        self.compressed
    }

    /// Access the point form
    pub fn as_point(&self) -> &RistrettoPoint {
        &self.point
    }

    /// Extract the point form
    pub fn into_point(self) -> RistrettoPoint {
        self.point
    }

    /// Decompress into the `RistrettoBoth` format that also retains the
    /// compressed form.
    pub fn from_compressed(compressed: CompressedRistretto) -> MultiSigResult<RistrettoBoth> {
        Ok(RistrettoBoth {
            point: compressed.decompress().ok_or(MultiSigError::PointDecompressionError)?,
            compressed,
        })
    }

    /// Compress into the `RistrettoBoth` format that also retains the
    /// uncompressed form.
    pub fn from_point(point: RistrettoPoint) -> RistrettoBoth {
        RistrettoBoth { compressed: point.compress(), point }
    }

    /// Convert this point to a byte array.
    #[inline]
    pub fn to_bytes(&self) -> [u8; RISTRETTO_POINT_LENGTH] {
        self.compressed.to_bytes()
    }
}

/// We hide fields largely so that only comparing the compressed forms
/// works.
impl PartialEq<Self> for RistrettoBoth {
    fn eq(&self, other: &Self) -> bool {
        let r = self.compressed.eq(&other.compressed);
        debug_assert_eq!(r, self.point.eq(&other.point));
        r
    }
}

impl PartialOrd<RistrettoBoth> for RistrettoBoth {
    fn partial_cmp(&self, other: &RistrettoBoth) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RistrettoBoth {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compressed.0.cmp(&other.compressed.0)
    }
}

impl Hash for RistrettoBoth {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.compressed.0.hash(state);
    }
}
