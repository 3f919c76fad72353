//! Network identity primitives.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    sync::Arc,
};

/// The hash function used to derive identifiers from key material.
pub type DefaultHashFunction = blake3::Hasher;

/// The keypair a node uses for its transport identity.
pub type NetworkKeypair = libp2p::identity::Keypair;

/// Public half of a node's transport identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkPublicKey(libp2p::identity::PublicKey);

impl NetworkPublicKey {
    /// The protobuf encoding of the key, used for hashing and serialization.
    pub fn to_protobuf(&self) -> Vec<u8> {
        self.0.encode_protobuf()
    }

    /// Borrow the underlying libp2p key.
    pub fn inner(&self) -> &libp2p::identity::PublicKey {
        &self.0
    }

    /// Consume the wrapper.
    pub fn into_inner(self) -> libp2p::identity::PublicKey {
        self.0
    }
}

impl From<libp2p::identity::PublicKey> for NetworkPublicKey {
    fn from(value: libp2p::identity::PublicKey) -> Self {
        Self(value)
    }
}

impl Serialize for NetworkPublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            // JSON: serialize as bs58 string
            serializer.serialize_str(&bs58::encode(self.to_protobuf()).into_string())
        } else {
            // Binary: serialize the protobuf bytes
            self.to_protobuf().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for NetworkPublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let bytes = if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            bs58::decode(s).into_vec().map_err(D::Error::custom)?
        } else {
            Vec::<u8>::deserialize(deserializer)?
        };
        let key = libp2p::identity::PublicKey::try_decode_protobuf(&bytes)
            .map_err(D::Error::custom)?;
        Ok(Self(key))
    }
}

// Every node gets uniquely identified by the PeerId.
// The type can be easily swapped without needing to change anything else in the implementation.
// Currently it is the hash of the node's transport key (which will be stable).
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash)]
pub struct PeerId(Arc<[u8; 32]>);

impl PeerId {
    /// Create a `PeerId` from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(Arc::new(bytes))
    }

    /// Derive the identifier from a transport public key.
    pub fn from_network_key(key: &NetworkPublicKey) -> Self {
        let mut hasher = DefaultHashFunction::new();
        hasher.update(&key.to_protobuf());
        Self(Arc::new(*hasher.finalize().as_bytes()))
    }

    pub fn dummy_for_test(byte: u8) -> Self {
        Self(Arc::new([byte; 32]))
    }
}

impl From<&NetworkPublicKey> for PeerId {
    fn from(value: &NetworkPublicKey) -> Self {
        Self::from_network_key(value)
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self(Arc::new([0_u8; 32]))
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bs58::encode(&*self.0).into_string())
    }
}

impl std::fmt::Debug for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&bs58::encode(&*self.0).into_string())
    }
}

impl Serialize for PeerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            // JSON: serialize as bs58 string
            serializer.serialize_str(&self.to_string())
        } else {
            // Binary: serialize as raw bytes
            self.0.as_ref().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for PeerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        if deserializer.is_human_readable() {
            // JSON: deserialize from bs58 string
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(D::Error::custom)
        } else {
            // Binary: deserialize from raw bytes
            let bytes = <[u8; 32]>::deserialize(deserializer)?;
            Ok(Self::from_bytes(bytes))
        }
    }
}

/// Error when parsing a `PeerId` from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePeerIdError {
    /// Invalid bs58 encoding.
    InvalidBs58(String),
    /// Invalid length (expected 32 bytes).
    InvalidLength { expected: usize, actual: usize },
}

impl Display for ParsePeerIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBs58(msg) => write!(f, "invalid bs58 encoding: {msg}"),
            Self::InvalidLength { expected, actual } => {
                write!(f, "invalid length: expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for ParsePeerIdError {}

impl FromStr for PeerId {
    type Err = ParsePeerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes =
            bs58::decode(s).into_vec().map_err(|e| ParsePeerIdError::InvalidBs58(e.to_string()))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            ParsePeerIdError::InvalidLength { expected: 32, actual: v.len() }
        })?;
        Ok(Self::from_bytes(bytes))
    }
}
