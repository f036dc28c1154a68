// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Errors which may occur while aggregating keys and nonces, cosigning,
//! or parsing keys and signatures from wire formats.
//!
//! A failed verification equation is not an error here: `verify`
//! returns `Ok(false)`.  Errors instead flag either a caller bug, which
//! should abort the signing session, or bytes that do not encode the
//! value they claim to, which should be rejected as a bad message.
//! None of these errors is transient, so nothing should be retried.

use core::fmt;
use core::fmt::Display;

/// `Result` specialized to this crate for convenience.
pub type MultiSigResult<T> = Result<T, MultiSigError>;

/// The two broad families of `MultiSigError`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A caller supplied inconsistent protocol inputs.
    InvalidInput,
    /// Bytes failed to decode into a canonical point or scalar.
    MalformedEncoding,
}

/// Errors which may occur while running the multi-signature protocol.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MultiSigError {
    /// Invalid point provided, usually to `from_bytes` methods.
    PointDecompressionError,
    /// Invalid scalar provided, usually to `Signature::from_bytes`.
    ScalarFormatError,
    /// An error in the length of bytes handed to a constructor.
    ///
    /// To use this, pass a string specifying the `name` of the type
    /// which is returning the error, and the `length` in bytes which
    /// its constructor expects.
    BytesLengthError {
        /// Identifies the type returning the error
        name: &'static str,
        /// Describes the type returning the error
        description: &'static str,
        /// Length expected by the constructor in bytes
        length: usize,
    },
    /// The public half of a serialized keypair does not match its secret half.
    KeypairMismatch,
    /// Key aggregation was attempted on an empty key set.
    EmptyKeySet,
    /// A nonce multiplicity of zero was requested.
    ZeroNonceMultiplicity,
    /// The nonce matrix has no rows, so no signers.
    EmptyNonceMatrix,
    /// A nonce matrix row has the wrong width.
    NonceMatrixShape {
        /// Row at which the mismatch was found
        row: usize,
        /// Width expected from the first row or the configuration
        expected: usize,
        /// Width actually found
        found: usize,
    },
    /// The nonce matrix row count differs from the number of signers.
    SignerCountMismatch {
        /// Number of public keys in the session
        keys: usize,
        /// Number of nonce matrix rows
        rows: usize,
    },
    /// A signer index lies outside the nonce matrix.
    SignerIndexOutOfRange {
        /// The offending index
        index: usize,
        /// Number of signers in the session
        signers: usize,
    },
    /// A signer supplied a number of nonces different from the configured `ν`.
    NonceCountMismatch {
        /// The configured nonce multiplicity
        expected: usize,
        /// Number of nonces supplied
        found: usize,
    },
    /// A signer's own nonce commitments do not appear in its matrix row.
    NonceCommitmentMismatch {
        /// The signer index whose row disagrees
        index: usize,
    },
    /// The signing keypair does not appear at its claimed index in the key set.
    SignerKeyMismatch {
        /// The signer index whose key disagrees
        index: usize,
    },
    /// Aggregation was attempted with no partial signatures.
    NoPartialSignatures,
    /// The number of partial signatures differs from the number of signers.
    PartialSignatureCountMismatch {
        /// Number of signers in the session
        expected: usize,
        /// Number of partial signatures supplied
        found: usize,
    },
    /// A partial signature failed its individual verification equation.
    InvalidPartialSignature {
        /// Index of the signer whose partial signature is wrong
        index: usize,
    },
}

impl MultiSigError {
    /// Classify this error as a caller bug or a decoding failure.
    pub fn kind(&self) -> ErrorKind {
        use MultiSigError::*;
        match self {
            PointDecompressionError | ScalarFormatError | BytesLengthError { .. } | KeypairMismatch =>
                ErrorKind::MalformedEncoding,
            _ => ErrorKind::InvalidInput,
        }
    }
}

impl Display for MultiSigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::MultiSigError::*;
        match *self {
            PointDecompressionError =>
                write!(f, "Cannot decompress Ristretto point"),
            ScalarFormatError =>
                write!(f, "Cannot use scalar that is not canonically reduced"),
            BytesLengthError { name, length, .. } =>
                write!(f, "{} must be {} bytes in length", name, length),
            KeypairMismatch =>
                write!(f, "Keypair public key does not match its secret key"),
            EmptyKeySet =>
                write!(f, "Cannot aggregate an empty set of public keys"),
            ZeroNonceMultiplicity =>
                write!(f, "Each signer must contribute at least one nonce"),
            EmptyNonceMatrix =>
                write!(f, "Cannot build a nonce matrix without signers"),
            NonceMatrixShape { row, expected, found } =>
                write!(f, "Nonce matrix row {} has {} commitments, expected {}", row, found, expected),
            SignerCountMismatch { keys, rows } =>
                write!(f, "Nonce matrix has {} rows for {} public keys", rows, keys),
            SignerIndexOutOfRange { index, signers } =>
                write!(f, "Signer index {} out of range for {} signers", index, signers),
            NonceCountMismatch { expected, found } =>
                write!(f, "Signer supplied {} nonces, expected {}", found, expected),
            NonceCommitmentMismatch { index } =>
                write!(f, "Nonce commitments of signer {} differ from the nonce matrix", index),
            SignerKeyMismatch { index } =>
                write!(f, "Public key of signer {} differs from the key set", index),
            NoPartialSignatures =>
                write!(f, "Cannot aggregate zero partial signatures"),
            PartialSignatureCountMismatch { expected, found } =>
                write!(f, "Received {} partial signatures, expected {}", found, expected),
            InvalidPartialSignature { index } =>
                write!(f, "Partial signature of signer {} failed to verify", index),
        }
    }
}

#[cfg(feature = "std")]
impl ::std::error::Error for MultiSigError {}

/// Convert `MultiSigError` into `::serde::de::Error` aka `SerdeError`
///
/// We should do this with `From` but right now the orphan rules prohibit
/// `impl From<MultiSigError> for E where E: serde::de::Error`.
#[cfg(feature = "serde")]
pub(crate) fn serde_error_from_multisig_error<E>(err: MultiSigError) -> E
where
    E: serde::de::Error,
{
    match err {
        MultiSigError::PointDecompressionError =>
            E::custom("Ristretto point decompression failed"),
        MultiSigError::ScalarFormatError =>
            E::custom("improper scalar has high-bit set"),
        MultiSigError::BytesLengthError { description, length, .. } =>
            E::invalid_length(length, &description),
        other => E::custom(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoding_errors_are_distinguishable() {
        assert_eq!(MultiSigError::PointDecompressionError.kind(), ErrorKind::MalformedEncoding);
        assert_eq!(MultiSigError::ScalarFormatError.kind(), ErrorKind::MalformedEncoding);
        assert_eq!(MultiSigError::EmptyKeySet.kind(), ErrorKind::InvalidInput);
        assert_eq!(MultiSigError::EmptyNonceMatrix.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            MultiSigError::SignerIndexOutOfRange { index: 4, signers: 3 }.kind(),
            ErrorKind::InvalidInput
        );
    }
}
