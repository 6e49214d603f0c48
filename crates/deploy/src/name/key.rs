//! Ed25519 name keys and their IPNS identifiers.
//!
//! Keys are exchanged in the libp2p protobuf encoding (the same bytes w3name
//! stores as `key.raw`), and names are CIDv1 `libp2p-key` identifiers over an
//! identity multihash of the protobuf public key, printed in base36.

use crate::errors::{DeployError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use cid::multibase::Base;
use cid::multihash::Multihash;
use cid::Cid;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use prost::Message;
use rand_core::OsRng;
use std::fmt;
use std::str::FromStr;

const LIBP2P_KEY_CODEC: u64 = 0x72;
const IDENTITY_MULTIHASH: u64 = 0x00;
const KEY_TYPE_ED25519: i32 = 1;

/// libp2p `PublicKey` / `PrivateKey` protobuf envelope.
#[derive(Clone, PartialEq, Message)]
struct KeyEnvelope {
    #[prost(int32, required, tag = "1")]
    key_type: i32,
    #[prost(bytes = "vec", required, tag = "2")]
    data: Vec<u8>,
}

/// Public identifier of a name: `k51qzi5uqu5d...`.
#[derive(Clone, PartialEq, Eq)]
pub struct IpnsName {
    public_key: VerifyingKey,
    encoded: String,
}

impl IpnsName {
    pub fn from_public_key(public_key: VerifyingKey) -> Result<Self> {
        let envelope = KeyEnvelope {
            key_type: KEY_TYPE_ED25519,
            data: public_key.to_bytes().to_vec(),
        }
        .encode_to_vec();
        let hash = Multihash::<64>::wrap(IDENTITY_MULTIHASH, &envelope)
            .map_err(|e| DeployError::InvalidName(e.to_string()))?;
        let encoded = Cid::new_v1(LIBP2P_KEY_CODEC, hash)
            .to_string_of_base(Base::Base36Lower)
            .map_err(|e| DeployError::InvalidName(e.to_string()))?;
        Ok(Self {
            public_key,
            encoded,
        })
    }

    pub fn public_key(&self) -> &VerifyingKey {
        &self.public_key
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

impl FromStr for IpnsName {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self> {
        let cid = Cid::try_from(s.trim()).map_err(|e| DeployError::InvalidName(e.to_string()))?;
        if cid.codec() != LIBP2P_KEY_CODEC {
            return Err(DeployError::InvalidName(format!(
                "expected libp2p-key codec, got 0x{:x}",
                cid.codec()
            )));
        }
        if cid.hash().code() != IDENTITY_MULTIHASH {
            return Err(DeployError::InvalidName(
                "only inlined (identity) Ed25519 keys are supported".into(),
            ));
        }
        let envelope = KeyEnvelope::decode(cid.hash().digest())
            .map_err(|e| DeployError::InvalidName(e.to_string()))?;
        if envelope.key_type != KEY_TYPE_ED25519 {
            return Err(DeployError::InvalidName(format!(
                "unsupported key type {}",
                envelope.key_type
            )));
        }
        let bytes: [u8; 32] = envelope
            .data
            .as_slice()
            .try_into()
            .map_err(|_| DeployError::InvalidName("Ed25519 public key must be 32 bytes".into()))?;
        let public_key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| DeployError::InvalidName(e.to_string()))?;
        Self::from_public_key(public_key)
    }
}

impl fmt::Display for IpnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for IpnsName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IpnsName({})", self.encoded)
    }
}

/// Private key controlling an IPNS name.
#[derive(Clone)]
pub struct NameKey {
    signing_key: SigningKey,
    name: IpnsName,
}

impl NameKey {
    pub fn generate() -> Result<Self> {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_signing_key(signing_key: SigningKey) -> Result<Self> {
        let name = IpnsName::from_public_key(signing_key.verifying_key())?;
        Ok(Self { signing_key, name })
    }

    /// Decode raw key bytes: a libp2p protobuf private key, a 64-byte
    /// keypair, or a 32-byte seed.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        let signing_key = match raw.len() {
            32 => {
                let seed: [u8; 32] = raw
                    .try_into()
                    .map_err(|_| DeployError::InvalidSigningKey("bad seed length".into()))?;
                SigningKey::from_bytes(&seed)
            }
            64 => keypair_from_slice(raw)?,
            _ => {
                let envelope = KeyEnvelope::decode(raw)
                    .map_err(|e| DeployError::InvalidSigningKey(e.to_string()))?;
                if envelope.key_type != KEY_TYPE_ED25519 {
                    return Err(DeployError::InvalidSigningKey(format!(
                        "unsupported key type {}",
                        envelope.key_type
                    )));
                }
                match envelope.data.len() {
                    64 => keypair_from_slice(&envelope.data)?,
                    len => {
                        return Err(DeployError::InvalidSigningKey(format!(
                            "expected 64 byte Ed25519 keypair, got {len} bytes"
                        )))
                    }
                }
            }
        };
        Self::from_signing_key(signing_key)
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let raw = BASE64
            .decode(encoded.trim())
            .map_err(|e| DeployError::InvalidSigningKey(format!("invalid base64: {e}")))?;
        Self::from_bytes(&raw)
    }

    /// libp2p protobuf encoding of the private key.
    pub fn to_bytes(&self) -> Vec<u8> {
        KeyEnvelope {
            key_type: KEY_TYPE_ED25519,
            data: self.signing_key.to_keypair_bytes().to_vec(),
        }
        .encode_to_vec()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn name(&self) -> &IpnsName {
        &self.name
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameKey")
            .field("name", &self.name.as_str())
            .finish_non_exhaustive()
    }
}

fn keypair_from_slice(bytes: &[u8]) -> Result<SigningKey> {
    let keypair: [u8; 64] = bytes
        .try_into()
        .map_err(|_| DeployError::InvalidSigningKey("bad keypair length".into()))?;
    SigningKey::from_keypair_bytes(&keypair)
        .map_err(|e| DeployError::InvalidSigningKey(e.to_string()))
}
