//! ECDSA on NIST curves: `ES256` (P-256), `ES384` (P-384) and `ES512` (P-521).
//!
//! Signatures are encoded as fixed-width `r || s` concatenations, as required by JWS.
//! Each curve hashes the message with its matching SHA-2 function.

use anyhow::{anyhow, Context as _};
use p256::ecdsa::signature::{Signer, Verifier};

use core::fmt;

use super::HashAlg;
use crate::{ConfigError, SignatureError};

/// Implements key parsing, signing and verification for a single curve. Private keys
/// may be encoded as PKCS#8 or SEC1 PEM; public keys as SPKI PEM.
macro_rules! ecdsa_impl {
    ($module:ident, $curve:ident, $curve_name:expr) => {
        mod $module {
            pub(super) use $curve::ecdsa::{SigningKey, VerifyingKey};
            use $curve::{
                ecdsa::Signature,
                pkcs8::{DecodePrivateKey, DecodePublicKey},
                PublicKey, SecretKey,
            };

            use super::*;

            pub(super) fn signing_key(pem: &str) -> anyhow::Result<SigningKey> {
                let secret_key = SecretKey::from_pkcs8_pem(pem)
                    .or_else(|_| SecretKey::from_sec1_pem(pem))
                    .map_err(|err| anyhow!("cannot parse {} private key: {err}", $curve_name))?;
                SigningKey::from_bytes(&secret_key.to_bytes()).map_err(|err| anyhow!(err))
            }

            pub(super) fn verifying_key(pem: &str) -> anyhow::Result<VerifyingKey> {
                let public_key = PublicKey::from_public_key_pem(pem)
                    .map_err(|err| anyhow!("cannot parse {} public key: {err}", $curve_name))?;
                VerifyingKey::from_sec1_bytes(&public_key.to_sec1_bytes())
                    .map_err(|err| anyhow!(err))
            }

            pub(super) fn sign(
                signing_key: &SigningKey,
                message: &[u8],
            ) -> Result<Vec<u8>, ConfigError> {
                let signature: Signature = signing_key
                    .try_sign(message)
                    .map_err(|err| ConfigError::MalformedKey(anyhow!(err)))?;
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify(
                verifying_key: &VerifyingKey,
                message: &[u8],
                signature: &[u8],
            ) -> Result<(), SignatureError> {
                let signature = Signature::try_from(signature)
                    .map_err(|err| SignatureError::MalformedSignature(anyhow!(err)))?;
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| SignatureError::InvalidSignature)
            }
        }
    };
}

ecdsa_impl!(es256, p256, "P-256");
ecdsa_impl!(es384, p384, "P-384");
ecdsa_impl!(es512, p521, "P-521");

/// Parsed ECDSA private key. The curve is fixed by the algorithm the key was parsed for.
pub(crate) enum SigningKey {
    P256(es256::SigningKey),
    P384(es384::SigningKey),
    P521(es512::SigningKey),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = match self {
            Self::P256(_) => "P-256",
            Self::P384(_) => "P-384",
            Self::P521(_) => "P-521",
        };
        formatter.debug_tuple("SigningKey").field(&curve).finish()
    }
}

/// Parsed ECDSA public key.
pub(crate) enum VerifyingKey {
    P256(es256::VerifyingKey),
    P384(es384::VerifyingKey),
    P521(es512::VerifyingKey),
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let curve = match self {
            Self::P256(_) => "P-256",
            Self::P384(_) => "P-384",
            Self::P521(_) => "P-521",
        };
        formatter.debug_tuple("VerifyingKey").field(&curve).finish()
    }
}

fn pem_str(pem: &[u8]) -> anyhow::Result<&str> {
    core::str::from_utf8(pem).context("ECDSA key is not UTF-8")
}

/// Parses a private key on the curve matching `hash`.
pub(super) fn parse_signing_key(hash: HashAlg, private_key: &[u8]) -> anyhow::Result<SigningKey> {
    let pem = pem_str(private_key)?;
    Ok(match hash {
        HashAlg::Sha256 => SigningKey::P256(es256::signing_key(pem)?),
        HashAlg::Sha384 => SigningKey::P384(es384::signing_key(pem)?),
        HashAlg::Sha512 => SigningKey::P521(es512::signing_key(pem)?),
    })
}

/// Parses a public key on the curve matching `hash`.
pub(super) fn parse_verifying_key(
    hash: HashAlg,
    public_key: &[u8],
) -> anyhow::Result<VerifyingKey> {
    let pem = pem_str(public_key)?;
    Ok(match hash {
        HashAlg::Sha256 => VerifyingKey::P256(es256::verifying_key(pem)?),
        HashAlg::Sha384 => VerifyingKey::P384(es384::verifying_key(pem)?),
        HashAlg::Sha512 => VerifyingKey::P521(es512::verifying_key(pem)?),
    })
}

pub(super) fn sign(signing_key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, ConfigError> {
    match signing_key {
        SigningKey::P256(key) => es256::sign(key, message),
        SigningKey::P384(key) => es384::sign(key, message),
        SigningKey::P521(key) => es512::sign(key, message),
    }
}

pub(super) fn verify(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    match verifying_key {
        VerifyingKey::P256(key) => es256::verify(key, message, signature),
        VerifyingKey::P384(key) => es384::verify(key, message, signature),
        VerifyingKey::P521(key) => es512::verify(key, message, signature),
    }
}
