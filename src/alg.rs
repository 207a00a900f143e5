//! Registry of supported JWT signing algorithms, and dispatch to the cryptographic
//! backends implementing them.
//!
//! The registry is a static table; an algorithm is always looked up by its identifier
//! from the engine configuration, never from a token header.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use core::{fmt, str::FromStr};

use crate::{ConfigError, SignatureError};

mod ecdsa;
mod generic;
mod hmacs;
mod rsa;

pub use self::generic::SecretBytes;

/// Family of a signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Unsecured tokens with an empty signature.
    None,
    /// Symmetric HMAC-based integrity.
    Hmac,
    /// RSASSA-PKCS1-v1_5 signatures.
    Rsa,
    /// ECDSA signatures on NIST curves.
    Ecdsa,
}

/// Hash function used by a signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlg {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlg {
    /// Output size of the hash function in bytes.
    pub fn output_size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }
}

/// Role of key material in the engine [`Configuration`](crate::Configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyRole {
    /// Symmetric secret, used both for signing and verification.
    Secret,
    /// PEM-encoded private key.
    PrivateKey,
    /// PEM-encoded public key.
    PublicKey,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Secret => "secret",
            Self::PrivateKey => "private key",
            Self::PublicKey => "public key",
        })
    }
}

/// Supported signing algorithm.
///
/// The variants are listed in the same order as [`supported()`] returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Algorithm {
    /// Unsecured token.
    #[serde(rename = "none")]
    None,
    /// HMAC with SHA-256.
    #[serde(rename = "HS256")]
    Hs256,
    /// HMAC with SHA-384.
    #[serde(rename = "HS384")]
    Hs384,
    /// HMAC with SHA-512.
    #[serde(rename = "HS512")]
    Hs512,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    #[serde(rename = "RS256")]
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    #[serde(rename = "RS384")]
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    #[serde(rename = "RS512")]
    Rs512,
    /// ECDSA on P-256 with SHA-256.
    #[serde(rename = "ES256")]
    Es256,
    /// ECDSA on P-384 with SHA-384.
    #[serde(rename = "ES384")]
    Es384,
    /// ECDSA on P-521 with SHA-512.
    #[serde(rename = "ES512")]
    Es512,
}

impl Algorithm {
    /// Returns the name of this algorithm, as mentioned in the `alg` field of the JWT header.
    pub fn name(self) -> &'static str {
        self.spec().name()
    }

    /// Returns the registry entry for this algorithm.
    pub fn spec(self) -> &'static AlgorithmSpec {
        &SUPPORTED[self as usize]
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup(s).map(|spec| spec.algorithm)
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.name().to_owned()
    }
}

/// Cryptographic primitive behind an algorithm. Each family has a single
/// sign / verify implementation parameterized by the hash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Primitive {
    Unsecured,
    Hmac(HashAlg),
    Rsa(HashAlg),
    Ecdsa(HashAlg),
}

/// Registry entry describing a signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmSpec {
    algorithm: Algorithm,
    name: &'static str,
    primitive: Primitive,
    description: &'static str,
}

impl AlgorithmSpec {
    const fn new(
        algorithm: Algorithm,
        name: &'static str,
        primitive: Primitive,
        description: &'static str,
    ) -> Self {
        Self {
            algorithm,
            name,
            primitive,
            description,
        }
    }

    /// Returns the algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the algorithm identifier (e.g., `HS256`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns a human-readable description of the algorithm.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the algorithm family.
    pub fn family(&self) -> AlgorithmFamily {
        match self.primitive {
            Primitive::Unsecured => AlgorithmFamily::None,
            Primitive::Hmac(_) => AlgorithmFamily::Hmac,
            Primitive::Rsa(_) => AlgorithmFamily::Rsa,
            Primitive::Ecdsa(_) => AlgorithmFamily::Ecdsa,
        }
    }

    /// Returns the hash function, or `None` for the unsecured algorithm.
    pub fn hash(&self) -> Option<HashAlg> {
        match self.primitive {
            Primitive::Unsecured => None,
            Primitive::Hmac(hash) | Primitive::Rsa(hash) | Primitive::Ecdsa(hash) => Some(hash),
        }
    }

    /// Key role required to issue tokens, or `None` if no key is required.
    pub fn signing_key(&self) -> Option<KeyRole> {
        match self.family() {
            AlgorithmFamily::None => None,
            AlgorithmFamily::Hmac => Some(KeyRole::Secret),
            AlgorithmFamily::Rsa | AlgorithmFamily::Ecdsa => Some(KeyRole::PrivateKey),
        }
    }

    /// Key role required to verify tokens, or `None` if no key is required.
    pub fn verifying_key(&self) -> Option<KeyRole> {
        match self.family() {
            AlgorithmFamily::None => None,
            AlgorithmFamily::Hmac => Some(KeyRole::Secret),
            AlgorithmFamily::Rsa | AlgorithmFamily::Ecdsa => Some(KeyRole::PublicKey),
        }
    }

    /// Parses key material for the [signing role](Self::signing_key()). For the unsecured
    /// algorithm, `material` is ignored.
    pub(crate) fn parse_signing_key(&self, material: &[u8]) -> anyhow::Result<SigningKey> {
        Ok(match self.primitive {
            Primitive::Unsecured => SigningKey::Unsecured,
            Primitive::Hmac(_) => SigningKey::Hmac(SecretBytes::owned(material.to_vec())),
            Primitive::Rsa(_) => SigningKey::Rsa(Box::new(rsa::parse_private_key(material)?)),
            Primitive::Ecdsa(hash) => {
                SigningKey::Ecdsa(ecdsa::parse_signing_key(hash, material)?)
            }
        })
    }

    /// Parses key material for the [verifying role](Self::verifying_key()).
    pub(crate) fn parse_verifying_key(&self, material: &[u8]) -> anyhow::Result<VerifyingKey> {
        Ok(match self.primitive {
            Primitive::Unsecured => VerifyingKey::Unsecured,
            Primitive::Hmac(_) => VerifyingKey::Hmac(SecretBytes::owned(material.to_vec())),
            Primitive::Rsa(_) => VerifyingKey::Rsa(Box::new(rsa::parse_public_key(material)?)),
            Primitive::Ecdsa(hash) => {
                VerifyingKey::Ecdsa(ecdsa::parse_verifying_key(hash, material)?)
            }
        })
    }

    /// Signs `message` with a key parsed by [`Self::parse_signing_key()`].
    pub(crate) fn sign(&self, key: &SigningKey, message: &[u8]) -> Result<Vec<u8>, ConfigError> {
        tracing::trace!(algorithm = self.name, "dispatching signature");
        match (self.primitive, key) {
            (Primitive::Unsecured, SigningKey::Unsecured) => Ok(Vec::new()),
            (Primitive::Hmac(hash), SigningKey::Hmac(secret)) => {
                Ok(hmacs::sign(hash, secret, message))
            }
            (Primitive::Rsa(hash), SigningKey::Rsa(private_key)) => {
                rsa::sign(hash, private_key, message)
            }
            (Primitive::Ecdsa(_), SigningKey::Ecdsa(signing_key)) => {
                ecdsa::sign(signing_key, message)
            }
            _ => Err(ConfigError::MalformedKey(anyhow!(
                "key does not belong to algorithm {}",
                self.name
            ))),
        }
    }

    /// Verifies `signature` over `message` with a key parsed by
    /// [`Self::parse_verifying_key()`].
    pub(crate) fn verify(
        &self,
        key: &VerifyingKey,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), SignatureError> {
        tracing::trace!(algorithm = self.name, "dispatching verification");
        match (self.primitive, key) {
            (Primitive::Unsecured, VerifyingKey::Unsecured) if signature.is_empty() => Ok(()),
            (Primitive::Unsecured, VerifyingKey::Unsecured) => {
                Err(SignatureError::UnexpectedSignature)
            }
            (Primitive::Hmac(hash), VerifyingKey::Hmac(secret)) => {
                if hmacs::verify(hash, secret, message, signature) {
                    Ok(())
                } else {
                    Err(SignatureError::InvalidSignature)
                }
            }
            (Primitive::Rsa(hash), VerifyingKey::Rsa(public_key)) => {
                rsa::verify(hash, public_key, message, signature)
            }
            (Primitive::Ecdsa(_), VerifyingKey::Ecdsa(verifying_key)) => {
                ecdsa::verify(verifying_key, message, signature)
            }
            _ => Err(SignatureError::MalformedKey(anyhow!(
                "key does not belong to algorithm {}",
                self.name
            ))),
        }
    }
}

/// Private key material parsed for a specific algorithm.
pub(crate) enum SigningKey {
    Unsecured,
    Hmac(SecretBytes<'static>),
    Rsa(Box<::rsa::RsaPrivateKey>),
    Ecdsa(ecdsa::SigningKey),
}

/// Public key material parsed for a specific algorithm.
pub(crate) enum VerifyingKey {
    Unsecured,
    Hmac(SecretBytes<'static>),
    Rsa(Box<::rsa::RsaPublicKey>),
    Ecdsa(ecdsa::VerifyingKey),
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsecured => formatter.write_str("Unsecured"),
            Self::Hmac(secret) => formatter.debug_tuple("Hmac").field(secret).finish(),
            Self::Rsa(_) => formatter.write_str("Rsa"),
            Self::Ecdsa(key) => fmt::Debug::fmt(key, formatter),
        }
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsecured => formatter.write_str("Unsecured"),
            Self::Hmac(secret) => formatter.debug_tuple("Hmac").field(secret).finish(),
            Self::Rsa(key) => formatter.debug_tuple("Rsa").field(key).finish(),
            Self::Ecdsa(key) => fmt::Debug::fmt(key, formatter),
        }
    }
}

static SUPPORTED: [AlgorithmSpec; 10] = [
    AlgorithmSpec::new(
        Algorithm::None,
        "none",
        Primitive::Unsecured,
        "No digital signature or MAC",
    ),
    AlgorithmSpec::new(
        Algorithm::Hs256,
        "HS256",
        Primitive::Hmac(HashAlg::Sha256),
        "HMAC using SHA-256",
    ),
    AlgorithmSpec::new(
        Algorithm::Hs384,
        "HS384",
        Primitive::Hmac(HashAlg::Sha384),
        "HMAC using SHA-384",
    ),
    AlgorithmSpec::new(
        Algorithm::Hs512,
        "HS512",
        Primitive::Hmac(HashAlg::Sha512),
        "HMAC using SHA-512",
    ),
    AlgorithmSpec::new(
        Algorithm::Rs256,
        "RS256",
        Primitive::Rsa(HashAlg::Sha256),
        "RSASSA-PKCS1-v1_5 using SHA-256",
    ),
    AlgorithmSpec::new(
        Algorithm::Rs384,
        "RS384",
        Primitive::Rsa(HashAlg::Sha384),
        "RSASSA-PKCS1-v1_5 using SHA-384",
    ),
    AlgorithmSpec::new(
        Algorithm::Rs512,
        "RS512",
        Primitive::Rsa(HashAlg::Sha512),
        "RSASSA-PKCS1-v1_5 using SHA-512",
    ),
    AlgorithmSpec::new(
        Algorithm::Es256,
        "ES256",
        Primitive::Ecdsa(HashAlg::Sha256),
        "ECDSA using P-256 and SHA-256",
    ),
    AlgorithmSpec::new(
        Algorithm::Es384,
        "ES384",
        Primitive::Ecdsa(HashAlg::Sha384),
        "ECDSA using P-384 and SHA-384",
    ),
    AlgorithmSpec::new(
        Algorithm::Es512,
        "ES512",
        Primitive::Ecdsa(HashAlg::Sha512),
        "ECDSA using P-521 and SHA-512",
    ),
];

/// Returns all supported algorithms in their canonical order:
/// `none`, `HS256`, `HS384`, `HS512`, `RS256`, `RS384`, `RS512`, `ES256`, `ES384`, `ES512`.
pub fn supported() -> &'static [AlgorithmSpec] {
    &SUPPORTED
}

/// Looks up an algorithm by its identifier. Identifiers are case-sensitive.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedAlgorithm`] if the identifier is not in the registry.
/// This includes RSA-PSS identifiers (`PS256` etc.), which are deliberately not supported.
pub fn lookup(name: &str) -> Result<&'static AlgorithmSpec, ConfigError> {
    SUPPORTED
        .iter()
        .find(|spec| spec.name == name)
        .ok_or_else(|| ConfigError::UnsupportedAlgorithm(name.to_owned()))
}

fn has_family(name: &str, family: AlgorithmFamily) -> bool {
    lookup(name).is_ok_and(|spec| spec.family() == family)
}

/// Checks whether the named algorithm is HMAC-based.
pub fn is_hmac(name: &str) -> bool {
    has_family(name, AlgorithmFamily::Hmac)
}

/// Checks whether the named algorithm is an asymmetric signature (RSA or ECDSA).
pub fn is_sign(name: &str) -> bool {
    has_family(name, AlgorithmFamily::Rsa) || has_family(name, AlgorithmFamily::Ecdsa)
}

/// Checks whether the named algorithm is the unsecured `none` algorithm.
pub fn is_unsecured(name: &str) -> bool {
    has_family(name, AlgorithmFamily::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    #[test]
    fn supported_algorithms_are_ordered() {
        let names: Vec<_> = supported().iter().map(AlgorithmSpec::name).collect();
        assert_eq!(
            names,
            ["none", "HS256", "HS384", "HS512", "RS256", "RS384", "RS512", "ES256", "ES384", "ES512"]
        );
    }

    #[test]
    fn enum_variants_match_table() {
        for spec in supported() {
            assert_eq!(spec.algorithm().spec(), spec);
            assert_eq!(spec.algorithm().to_string(), spec.name());
            assert_eq!(spec.name().parse::<Algorithm>().unwrap(), spec.algorithm());
            let json = serde_json::to_string(&spec.algorithm()).unwrap();
            assert_eq!(json, format!("\"{}\"", spec.name()));
        }
    }

    #[test]
    fn pss_and_unknown_algorithms_are_rejected() {
        for name in ["PS256", "PS384", "PS512", "hs256", "EdDSA", "ES256K", ""] {
            assert_matches!(
                lookup(name).unwrap_err(),
                ConfigError::UnsupportedAlgorithm(ref s) if s == name
            );
            assert!(!is_hmac(name) && !is_sign(name) && !is_unsecured(name));
        }
    }

    #[test]
    fn classification() {
        assert!(is_unsecured("none"));
        assert!(is_hmac("HS384"));
        assert!(!is_sign("HS384"));
        assert!(is_sign("RS512"));
        assert!(is_sign("ES256"));
        assert!(!is_hmac("ES256"));
    }

    #[test]
    fn key_roles_follow_family() {
        let none = lookup("none").unwrap();
        assert_eq!(none.signing_key(), None);
        assert_eq!(none.verifying_key(), None);
        assert_eq!(none.hash(), None);

        let hs512 = lookup("HS512").unwrap();
        assert_eq!(hs512.signing_key(), Some(KeyRole::Secret));
        assert_eq!(hs512.verifying_key(), Some(KeyRole::Secret));
        assert_eq!(hs512.hash(), Some(HashAlg::Sha512));

        let es384 = lookup("ES384").unwrap();
        assert_eq!(es384.family(), AlgorithmFamily::Ecdsa);
        assert_eq!(es384.signing_key(), Some(KeyRole::PrivateKey));
        assert_eq!(es384.verifying_key(), Some(KeyRole::PublicKey));
        assert_eq!(es384.hash().map(HashAlg::output_size), Some(48));
    }

    #[test]
    fn unsecured_signature_must_be_empty() {
        let none = Algorithm::None.spec();
        let signing_key = none.parse_signing_key(&[]).unwrap();
        let verifying_key = none.parse_verifying_key(b"ignored").unwrap();
        assert!(none.sign(&signing_key, b"message").unwrap().is_empty());
        none.verify(&verifying_key, b"message", &[]).unwrap();
        assert_matches!(
            none.verify(&verifying_key, b"message", &[0]).unwrap_err(),
            SignatureError::UnexpectedSignature
        );
    }

    #[test]
    fn keys_are_bound_to_family() {
        let hs256 = Algorithm::Hs256.spec();
        let secret = hs256.parse_signing_key(b"secret").unwrap();
        assert_eq!(format!("{secret:?}"), "Hmac(SecretBytes { len: 6 })");
        let tag = hs256.sign(&secret, b"message").unwrap();
        let verifying_key = hs256.parse_verifying_key(b"secret").unwrap();
        hs256.verify(&verifying_key, b"message", &tag).unwrap();

        let none = Algorithm::None.spec();
        assert_matches!(
            none.sign(&secret, b"message").unwrap_err(),
            ConfigError::MalformedKey(_)
        );
        assert_matches!(
            none.verify(&verifying_key, b"message", &[]).unwrap_err(),
            SignatureError::MalformedKey(_)
        );

        assert!(Algorithm::Rs256.spec().parse_signing_key(b"secret").is_err());
        assert!(Algorithm::Es256.spec().parse_verifying_key(b"secret").is_err());
    }
}
