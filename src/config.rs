//! Engine configuration.

use serde::{Deserialize, Deserializer};

use crate::{
    alg::{Algorithm, KeyRole, SecretBytes},
    Claims, Header, TimeOptions, ValidationSet,
};

const DEFAULT_ALGORITHM: &str = "HS256";

/// Configuration of a [`JwtEngine`](crate::JwtEngine).
///
/// The configuration can be built fluently with `with_*` methods, or deserialized
/// (e.g., from a JSON or TOML config file). In the serialized form, the `secret` is
/// a base64url-encoded string with no padding, and both keys are PEM-encoded strings.
/// Time options and the custom validator cannot be deserialized.
///
/// The algorithm identifier is not checked here: an unsupported identifier is reported
/// by every sign / verify call of the engine.
///
/// # Examples
///
/// ```
/// # use jwt_engine::{alg::Algorithm, Claims, Configuration, ValidationSet};
/// let config = Configuration::new(Algorithm::Hs384)
///     .with_secret(b"super_secret_key_donut_steel".to_vec())
///     .with_claims(Claims::empty().with("iss", "auth.example.com").issue_at_signing())
///     .with_validations(ValidationSet::default().with_not_before(false));
///
/// let same_config: Configuration = serde_json::from_str(r#"{
///     "algorithm": "HS384",
///     "secret": "c3VwZXJfc2VjcmV0X2tleV9kb251dF9zdGVlbA",
///     "claims": { "iss": "auth.example.com", "iat": true },
///     "validations": { "nbf": false }
/// }"#)?;
/// assert_eq!(same_config.algorithm(), config.algorithm());
/// assert_eq!(same_config.claims(), config.claims());
/// # Ok::<_, serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    algorithm: String,
    secret: Option<SecretBytes<'static>>,
    #[serde(deserialize_with = "deserialize_pem")]
    private_key: Option<SecretBytes<'static>>,
    public_key: Option<String>,
    claims: Claims,
    header: Header,
    validations: ValidationSet,
    #[serde(skip)]
    time_options: TimeOptions,
}

fn deserialize_pem<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<SecretBytes<'static>>, D::Error> {
    let pem = Option::<String>::deserialize(deserializer)?;
    Ok(pem.map(SecretBytes::from))
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM.to_owned(),
            secret: None,
            private_key: None,
            public_key: None,
            claims: Claims::empty(),
            header: Header::empty(),
            validations: ValidationSet::default(),
            time_options: TimeOptions::default(),
        }
    }
}

impl Configuration {
    /// Creates a configuration for the specified algorithm with no keys, no default claims
    /// and default validations.
    pub fn new(algorithm: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            ..Self::default()
        }
    }

    /// Sets the algorithm identifier.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Sets the symmetric secret for HMAC algorithms.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<SecretBytes<'static>>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the PEM-encoded private key for RSA and ECDSA algorithms.
    #[must_use]
    pub fn with_private_key(mut self, pem: impl Into<String>) -> Self {
        let pem: String = pem.into();
        self.private_key = Some(SecretBytes::from(pem));
        self
    }

    /// Sets the PEM-encoded public key for RSA and ECDSA algorithms.
    #[must_use]
    pub fn with_public_key(mut self, pem: impl Into<String>) -> Self {
        self.public_key = Some(pem.into());
        self
    }

    /// Sets default claims included into every issued token.
    #[must_use]
    pub fn with_claims(mut self, claims: Claims) -> Self {
        self.claims = claims;
        self
    }

    /// Sets default header extensions included into every issued token.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.header = header;
        self
    }

    /// Sets validations applied to verified tokens.
    #[must_use]
    pub fn with_validations(mut self, validations: ValidationSet) -> Self {
        self.validations = validations;
        self
    }

    /// Sets the clock and leeway.
    #[must_use]
    pub fn with_time_options(mut self, time_options: TimeOptions) -> Self {
        self.time_options = time_options;
        self
    }

    /// Returns the algorithm identifier.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Returns the PEM-encoded public key, if any.
    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    /// Checks whether the secret is set.
    pub fn has_secret(&self) -> bool {
        self.key(KeyRole::Secret).is_some()
    }

    /// Checks whether the private key is set.
    pub fn has_private_key(&self) -> bool {
        self.key(KeyRole::PrivateKey).is_some()
    }

    /// Returns default claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns default header extensions.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns validations.
    pub fn validations(&self) -> &ValidationSet {
        &self.validations
    }

    /// Returns time options.
    pub fn time_options(&self) -> &TimeOptions {
        &self.time_options
    }

    /// Returns key material for the specified role. Empty keys are treated as absent.
    pub(crate) fn key(&self, role: KeyRole) -> Option<&[u8]> {
        let key: &[u8] = match role {
            KeyRole::Secret => self.secret.as_deref()?,
            KeyRole::PrivateKey => self.private_key.as_deref()?,
            KeyRole::PublicKey => self.public_key.as_deref()?.as_bytes(),
        };
        (!key.is_empty()).then_some(key)
    }

    pub(crate) fn set_algorithm(&mut self, algorithm: String) {
        self.algorithm = algorithm;
    }

    pub(crate) fn set_secret(&mut self, secret: SecretBytes<'static>) {
        self.secret = Some(secret);
    }

    pub(crate) fn set_private_key(&mut self, pem: String) {
        self.private_key = Some(SecretBytes::from(pem));
    }

    pub(crate) fn set_public_key(&mut self, pem: String) {
        self.public_key = Some(pem);
    }

    pub(crate) fn set_claims(&mut self, claims: Claims) {
        self.claims = claims;
    }

    pub(crate) fn set_header(&mut self, header: Header) {
        self.header = header;
    }

    pub(crate) fn set_validations(&mut self, validations: ValidationSet) {
        self.validations = validations;
    }

    pub(crate) fn set_time_options(&mut self, time_options: TimeOptions) {
        self.time_options = time_options;
    }
}

impl From<Algorithm> for Configuration {
    fn from(algorithm: Algorithm) -> Self {
        Self::new(algorithm)
    }
}
