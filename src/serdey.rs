// -*- mode: rust; -*-
//
// This file is part of aggsig.
// Copyright (c) 2024 Web 3 Foundation
// See LICENSE for licensing information.
//
// Authors:
// - Jeff Burdges <jeff@web3.foundation>

//! Serialization helpers shared by every fixed-length wire type.

#[cfg(feature = "serde")]
macro_rules! serde_boilerplate { ($t:ty) => {
impl serde::Serialize for $t {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: serde::Serializer {
        let bytes = &self.to_bytes()[..];
        serde::Serialize::serialize(serde_bytes::Bytes::new(bytes), serializer)
    }
}

impl<'d> serde::Deserialize<'d> for $t {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: serde::Deserializer<'d> {
        let bytes = <serde_bytes::ByteBuf as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_bytes(bytes.as_ref())
            .map_err(crate::errors::serde_error_from_multisig_error)
    }
}
} } // macro_rules! serde_boilerplate

#[cfg(not(feature = "serde"))]
macro_rules! serde_boilerplate { ($t:ty) => { } }
