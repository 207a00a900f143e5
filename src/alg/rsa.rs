//! RSA-based JWT schemes: `RS256`, `RS384` and `RS512`.
//!
//! Keys are PEM-encoded. Private keys may use PKCS#8 (`BEGIN PRIVATE KEY`) or
//! PKCS#1 (`BEGIN RSA PRIVATE KEY`) encoding; public keys may use SPKI
//! (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`) encoding.

use anyhow::{anyhow, Context as _};
use rand_core::OsRng;
use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey},
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey,
};
use sha2::{Digest, Sha256, Sha384, Sha512};

use super::HashAlg;
use crate::{ConfigError, SignatureError};

impl HashAlg {
    fn pkcs1v15(self) -> Pkcs1v15Sign {
        match self {
            Self::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            Self::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            Self::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    fn digest(self, message: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(message).to_vec(),
            Self::Sha384 => Sha384::digest(message).to_vec(),
            Self::Sha512 => Sha512::digest(message).to_vec(),
        }
    }
}

pub(super) fn parse_private_key(pem: &[u8]) -> anyhow::Result<RsaPrivateKey> {
    let pem = core::str::from_utf8(pem).context("RSA private key is not UTF-8")?;
    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
        .map_err(|err| anyhow!("cannot parse RSA private key: {err}"))
}

pub(super) fn parse_public_key(pem: &[u8]) -> anyhow::Result<RsaPublicKey> {
    let pem = core::str::from_utf8(pem).context("RSA public key is not UTF-8")?;
    RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|err| anyhow!("cannot parse RSA public key: {err}"))
}

/// Signs the digest of `message` with PKCS#1 v1.5 padding. Signing is blinded.
pub(super) fn sign(
    hash: HashAlg,
    private_key: &RsaPrivateKey,
    message: &[u8],
) -> Result<Vec<u8>, ConfigError> {
    let digest = hash.digest(message);
    private_key
        .sign_with_rng(&mut OsRng, hash.pkcs1v15(), &digest)
        .map_err(|err| ConfigError::MalformedKey(anyhow!("RSA signing failed: {err}")))
}

pub(super) fn verify(
    hash: HashAlg,
    public_key: &RsaPublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    let digest = hash.digest(message);
    public_key
        .verify(hash.pkcs1v15(), &digest, signature)
        .map_err(|_| SignatureError::InvalidSignature)
}
