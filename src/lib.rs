// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Aggregate Schnorr multi-signatures on the Ristretto group, with
//! several nonces per signer bound together by Fiat-Shamir coefficients.
//!
//! A fixed, ordered set of `n` signers, each holding an independent
//! [`Keypair`], jointly produce one 64 byte [`Signature`] that verifies
//! against the aggregate of their public keys.  Key aggregation uses
//! per-key weightings derived from the whole key set, as in MuSig, so
//! no signer can pick their key as a function of the others' keys.
//! Each signer contributes `ν` nonce commitments per session, and each
//! commitment receives a weighting derived from the message, the
//! aggregate key and every commitment of every signer, which defeats
//! Wagner-style attacks on two-round signing.
//!
//! # Example
//!
//! ```
//! use aggsig::{Keypair, KeyAggregation, NonceMatrix, ProtocolConfig, SigningNonces, SigningSession};
//!
//! let config = ProtocolConfig::default();
//! let message: &[u8] = b"We are legion!";
//!
//! let keypairs: Vec<Keypair> = (0..3).map(|_| Keypair::generate()).collect();
//! let public_keys: Vec<_> = keypairs.iter().map(|k| k.public).collect();
//!
//! // Round one: every signer commits to its nonces and broadcasts the commitments.
//! let nonces: Vec<SigningNonces> = keypairs.iter()
//!     .map(|k| SigningNonces::generate(&config, &k.secret))
//!     .collect();
//! let matrix = NonceMatrix::new(nonces.iter().map(|n| n.commitments().to_vec()).collect()).unwrap();
//!
//! // Once all commitments are known, each signer fixes the session and cosigns.
//! let keys = KeyAggregation::new(&public_keys).unwrap();
//! let session = SigningSession::new(config, keys, matrix, message).unwrap();
//! let partials: Vec<_> = keypairs.iter().zip(nonces)
//!     .enumerate()
//!     .map(|(i, (k, n))| session.partial_sign(i, k, n).unwrap())
//!     .collect();
//!
//! let signature = session.aggregate(&partials).unwrap();
//! assert!(aggsig::verify(message, &signature, &public_keys).unwrap());
//! ```
//!
//! # Nonce reuse
//!
//! A nonce must never sign two different messages, or two different
//! sessions over the same message: doing so reveals the signer's secret
//! key to anyone who sees both partial signatures.  [`SigningNonces`]
//! cannot be cloned and is consumed by signing, so in-process reuse does
//! not compile.  Any persistence of nonces between rounds, which this
//! crate deliberately does not provide, must uphold the same rule.

#![no_std]
#![warn(future_incompatible)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![deny(missing_docs)] // refuse to compile if documentation is missing

#[cfg(feature = "std")]
#[macro_use]
extern crate std;

extern crate alloc;

#[macro_use]
extern crate arrayref;

#[cfg(feature = "serde")]
extern crate serde_crate as serde;

#[macro_use]
mod serdey;

pub mod points;
pub mod errors;
pub mod context;
pub mod config;
pub mod keys;
pub mod aggregation;
pub mod nonces;
pub mod sign;
pub mod session;

pub use crate::aggregation::{aggregate_public_keys, AggregatePublicKey, KeyAggregation, KeySetDigest};
pub use crate::config::{BindingMode, ProtocolConfig};
pub use crate::errors::{ErrorKind, MultiSigError, MultiSigResult};
pub use crate::keys::*; // {SecretKey,PublicKey,Keypair} + *_LENGTH
pub use crate::nonces::{
    aggregate_nonces, NonceCoefficients, NonceCommitment, NonceMatrix, SigningNonces,
};
pub use crate::session::{SessionObserver, SessionStage, SigningSession};
pub use crate::sign::{
    aggregate_partial_signatures, challenge, partial_sign, verify, verify_aggregate, PartialSignature, Signature,
    PARTIAL_SIGNATURE_LENGTH, SIGNATURE_LENGTH,
};

/// Operating system randomness, or a panic on platforms without it.
pub(crate) fn getrandom_or_panic() -> impl rand_core::RngCore + rand_core::CryptoRng {
    getrandom_or_panic::getrandom_or_panic()
}
