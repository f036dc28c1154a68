// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! End to end signing through the public interface.

use aggsig::{
    aggregate_nonces, aggregate_partial_signatures, aggregate_public_keys, challenge, partial_sign,
    verify, BindingMode, ErrorKind, KeyAggregation, Keypair, NonceCommitment, NonceMatrix,
    PartialSignature, ProtocolConfig, PublicKey, SecretKey, Signature, SigningNonces, SigningSession,
    SIGNATURE_LENGTH,
};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;

/// Run the two rounds over the free functions, as independent signers would.
fn sign_with_free_functions(
    config: &ProtocolConfig,
    keypairs: &[Keypair],
    message: &[u8],
    csprng: &mut ChaChaRng,
) -> Signature {
    let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
    let (digest, x) = aggregate_public_keys(&public_keys).unwrap();

    let nonces: Vec<SigningNonces> = keypairs.iter()
        .map(|k| SigningNonces::generate_with(config, &k.secret, &mut *csprng))
        .collect();
    let matrix = NonceMatrix::new(nonces.iter().map(|n| n.commitments().to_vec()).collect()).unwrap();
    let r = aggregate_nonces(config, message, &matrix, &x).unwrap().compress();

    let partials: Vec<PartialSignature> = keypairs.iter().zip(nonces)
        .enumerate()
        .map(|(i, (k, n))| partial_sign(config, i, message, k, n, &r, &matrix, &x, &digest).unwrap())
        .collect();
    let s = aggregate_partial_signatures(&partials).unwrap();

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..32].copy_from_slice(r.as_bytes());
    bytes[32..].copy_from_slice(s.as_bytes());
    Signature::from_bytes(&bytes).unwrap()
}

fn sign_with_session(config: ProtocolConfig, keypairs: &[Keypair], message: &[u8]) -> Signature {
    let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
    let nonces: Vec<SigningNonces> = keypairs.iter()
        .map(|k| SigningNonces::generate(&config, &k.secret))
        .collect();
    let matrix = NonceMatrix::new(nonces.iter().map(|n| n.commitments().to_vec()).collect()).unwrap();
    let keys = KeyAggregation::new(&public_keys).unwrap();
    let session = SigningSession::new(config, keys, matrix, message).unwrap();
    let partials: Vec<PartialSignature> = keypairs.iter().zip(nonces)
        .enumerate()
        .map(|(i, (k, n))| session.partial_sign(i, k, n).unwrap())
        .collect();
    session.aggregate(&partials).unwrap()
}

#[test]
fn three_signers_two_nonces() {
    let mut csprng = ChaChaRng::from_seed([0u8; 32]);
    let config = ProtocolConfig::fiat_shamir(2).unwrap();
    let message: &[u8] = b"MuSig2";
    let keypairs: Vec<Keypair> = (0..3).map(|_| Keypair::generate_with(&mut csprng)).collect();
    let mut public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();

    let signature = sign_with_free_functions(&config, &keypairs, message, &mut csprng);
    assert!(verify(message, &signature, &public_keys).unwrap());

    // Flip one bit of one public key, choosing a bit whose flip still decodes.
    let original = public_keys[1].to_bytes();
    let flipped = (0..255usize)
        .find_map(|bit| {
            let mut bytes = original;
            bytes[bit / 8] ^= 1 << (bit % 8);
            PublicKey::from_bytes(&bytes).ok()
        })
        .expect("some single bit flip decodes");
    public_keys[1] = flipped;
    assert!(!verify(message, &signature, &public_keys).unwrap());
}

#[test]
fn every_configuration_signs() {
    let modes = [BindingMode::FiatShamir, BindingMode::MuSig2, BindingMode::PlainSum];
    for &mode in modes.iter() {
        for &n in [1usize, 2, 5].iter() {
            for &nu in [1usize, 2, 4].iter() {
                let config = ProtocolConfig::new(nu, mode).unwrap();
                let keypairs: Vec<Keypair> = (0..n).map(|_| Keypair::generate()).collect();
                let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
                let message = format!("{:?} n={} nu={}", mode, n, nu);
                let signature = sign_with_session(config, &keypairs, message.as_bytes());
                assert!(
                    verify(message.as_bytes(), &signature, &public_keys).unwrap(),
                    "{:?} with n={} and nu={} failed to verify", mode, n, nu
                );
            }
        }
    }
}

#[test]
fn replaced_key_fails_verification() {
    let config = ProtocolConfig::default();
    let message: &[u8] = b"rogue";
    let keypairs: Vec<Keypair> = (0..4).map(|_| Keypair::generate()).collect();
    let signature = sign_with_session(config, &keypairs, message);

    for i in 0..keypairs.len() {
        let mut public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
        public_keys[i] = Keypair::generate().public;
        assert!(!verify(message, &signature, &public_keys).unwrap());
    }
}

#[test]
fn tampered_nonce_matrix_fails_verification() {
    let config = ProtocolConfig::default();
    let message: &[u8] = b"tamper";
    let keypairs: Vec<Keypair> = (0..3).map(|_| Keypair::generate()).collect();
    let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
    let (digest, x) = aggregate_public_keys(&public_keys).unwrap();

    let nonces: Vec<SigningNonces> = keypairs.iter()
        .map(|k| SigningNonces::generate(&config, &k.secret))
        .collect();
    let rows: Vec<Vec<NonceCommitment>> = nonces.iter().map(|n| n.commitments().to_vec()).collect();
    let honest = NonceMatrix::new(rows.clone()).unwrap();

    // Signer 2 signs over a matrix whose entry (0, 1) was swapped for (0, 0).
    let mut altered_rows = rows;
    altered_rows[0][1] = altered_rows[0][0];
    let altered = NonceMatrix::new(altered_rows).unwrap();

    let r_honest = aggregate_nonces(&config, message, &honest, &x).unwrap().compress();
    let r_altered = aggregate_nonces(&config, message, &altered, &x).unwrap().compress();
    assert_ne!(r_honest, r_altered);

    let partials: Vec<PartialSignature> = keypairs.iter().zip(nonces)
        .enumerate()
        .map(|(i, (k, n))| {
            if i == 2 {
                partial_sign(&config, i, message, k, n, &r_altered, &altered, &x, &digest).unwrap()
            } else {
                partial_sign(&config, i, message, k, n, &r_honest, &honest, &x, &digest).unwrap()
            }
        })
        .collect();
    let s = aggregate_partial_signatures(&partials).unwrap();
    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..32].copy_from_slice(r_honest.as_bytes());
    bytes[32..].copy_from_slice(s.as_bytes());
    let signature = Signature::from_bytes(&bytes).unwrap();
    assert!(!verify(message, &signature, &public_keys).unwrap());
}

#[test]
fn challenge_is_shared_by_signers_and_verifier() {
    let config = ProtocolConfig::default();
    let message: &[u8] = b"challenge";
    let keypairs: Vec<Keypair> = (0..2).map(|_| Keypair::generate()).collect();
    let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
    let nonces: Vec<SigningNonces> = keypairs.iter()
        .map(|k| SigningNonces::generate(&config, &k.secret))
        .collect();
    let matrix = NonceMatrix::new(nonces.iter().map(|n| n.commitments().to_vec()).collect()).unwrap();
    let session = SigningSession::new(config, KeyAggregation::new(&public_keys).unwrap(), matrix, message).unwrap();

    let (_, x) = aggregate_public_keys(&public_keys).unwrap();
    assert_eq!(*session.challenge(), challenge(&x, session.aggregate_nonce(), message));
}

#[test]
fn seeded_signers_reproduce_keys() {
    let seeds = [[1u8; 32], [2u8; 32], [3u8; 32]];
    let keypairs: Vec<Keypair> = seeds.iter().map(|s| SecretKey::from_seed(s).to_keypair()).collect();
    let again: Vec<PublicKey> = seeds.iter().map(|s| SecretKey::from_seed(s).to_public()).collect();
    let public_keys: Vec<PublicKey> = keypairs.iter().map(|k| k.public).collect();
    assert_eq!(public_keys, again);

    let message: &[u8] = b"seeded";
    let signature = sign_with_session(ProtocolConfig::default(), &keypairs, message);
    assert!(verify(message, &signature, &again).unwrap());
}

#[test]
fn malformed_signatures_are_encoding_errors() {
    let keypairs: Vec<Keypair> = (0..2).map(|_| Keypair::generate()).collect();
    let signature = sign_with_session(ProtocolConfig::default(), &keypairs, b"bytes");
    let bytes = signature.to_bytes();
    assert_eq!(Signature::from_bytes(&bytes).unwrap(), signature);

    for bad in [&bytes[..0], &bytes[..32], &bytes[..63], &[0xffu8; 64][..]] {
        assert_eq!(Signature::from_bytes(bad).unwrap_err().kind(), ErrorKind::MalformedEncoding);
    }
}
