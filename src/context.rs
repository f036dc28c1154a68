// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Hashing for the multi-signature protocol.
//!
//! Every hash `H(·)` in the protocol is a `merlin::Transcript` opened
//! with its own protocol label, so weightings, digests and challenges
//! are domain separated from one another and from any other protocol
//! using merlin.  All scalars come from 64 bytes of transcript output
//! reduced modulo the group order.

use core::borrow::{Borrow, BorrowMut};

use curve25519_dalek::ristretto::CompressedRistretto;
use curve25519_dalek::scalar::Scalar;
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};

/// Transcript label for the key set digest `L`.
pub(crate) const KEY_SET_LABEL: &[u8] = b"AggSig-key-set";
/// Transcript label for the key weighting `a_i = H(L, P_i)`.
pub(crate) const KEY_COEFFICIENT_LABEL: &[u8] = b"AggSig-key-coefficient";
/// Transcript label for the nonce weightings `alpha_{i,j}`.
pub(crate) const NONCE_COEFFICIENT_LABEL: &[u8] = b"AggSig-nonce-coefficient";
/// Transcript label for the single MuSig2 weighting `b`.
pub(crate) const MUSIG2_COEFFICIENT_LABEL: &[u8] = b"AggSig-musig2-b";
/// Transcript label for the Fiat-Shamir challenge `c`.
pub(crate) const CHALLENGE_LABEL: &[u8] = b"AggSig-challenge";
/// Transcript label for hedged nonce generation.
pub(crate) const NONCE_GENERATION_LABEL: &[u8] = b"AggSig-nonce";

/// Protocol transcript used by every hash in this crate.
///
/// We provide an interface compatible with `merlin::Transcript`, and
/// abstract over owned and borrowed transcripts, so that the
/// coefficient computations may clone one shared prefix many times.
pub trait SigningTranscript {
    /// Extend transcript with some bytes, shadowed by `merlin::Transcript`.
    fn commit_bytes(&mut self, label: &'static [u8], bytes: &[u8]);

    /// Extend the transcript with a compressed Ristretto point
    fn commit_point(&mut self, label: &'static [u8], point: &CompressedRistretto) {
        self.commit_bytes(label, point.as_bytes());
    }

    /// Extend the transcript with a position or count, big endian.
    fn commit_index(&mut self, label: &'static [u8], index: u64) {
        self.commit_bytes(label, &index.to_be_bytes());
    }

    /// Produce some challenge bytes, shadowed by `merlin::Transcript`.
    fn challenge_bytes(&mut self, label: &'static [u8], dest: &mut [u8]);

    /// Produce a public challenge scalar.
    fn challenge_scalar(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }

    /// Produce a secret witness scalar, aka nonce, from the protocol
    /// transcript, any "nonce seeds" kept with the secret keys, and
    /// fresh randomness from `rng`.
    fn witness_scalar<R>(&self, label: &'static [u8], nonce_seeds: &[&[u8]], rng: R) -> Scalar
    where R: RngCore + CryptoRng;
}

impl<T> SigningTranscript for T
where T: Borrow<Transcript> + BorrowMut<Transcript>  // Transcript, &mut Transcript
{
    fn commit_bytes(&mut self, label: &'static [u8], bytes: &[u8]) {
        Transcript::append_message(self.borrow_mut(), label, bytes);
    }

    fn challenge_bytes(&mut self, label: &'static [u8], dest: &mut [u8]) {
        Transcript::challenge_bytes(self.borrow_mut(), label, dest);
    }

    fn witness_scalar<R>(&self, label: &'static [u8], nonce_seeds: &[&[u8]], mut rng: R) -> Scalar
    where R: RngCore + CryptoRng
    {
        let mut br = self.borrow().build_rng();
        for ns in nonce_seeds {
            br = br.rekey_with_witness_bytes(label, ns);
        }
        let mut r = br.finalize(&mut rng);
        Scalar::random(&mut r)
    }
}
