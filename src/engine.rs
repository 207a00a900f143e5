//! Token engine: issuing and verifying tokens according to a [`Configuration`].

use anyhow::anyhow;

use std::sync::Arc;

use crate::{
    alg::{self, AlgorithmSpec, KeyRole, SecretBytes, SigningKey, VerifyingKey},
    encoding::{base64url_decode, base64url_encode, encode_json},
    Claims, ClaimsValidator, ConfigError, Configuration, EncodingError, Error, Header,
    SignatureError, TimeOptions, UntrustedToken, ValidationSet,
};

/// Issues and verifies tokens with the algorithm and keys from its [`Configuration`].
///
/// The algorithm identifier is resolved once, when the engine is created or its algorithm
/// is changed. An unsupported identifier does not prevent creating the engine; instead,
/// every [`sign`](Self::sign()) / [`verify`](Self::verify()) call fails with
/// [`ConfigError::UnsupportedAlgorithm`]. Keys are parsed at the same time and whenever
/// they are replaced; a key that cannot be parsed is reported by every call that needs it.
///
/// Verification always uses the configured algorithm. A token whose header names
/// another algorithm is rejected with [`SignatureError::AlgorithmMismatch`].
///
/// # Examples
///
/// ```
/// # use jwt_engine::{alg::Algorithm, Claims, Configuration, JwtEngine};
/// # use futures::executor::block_on;
/// # fn main() -> anyhow::Result<()> {
/// let config = Configuration::new(Algorithm::Hs256).with_secret(b"secret".to_vec());
/// let engine = JwtEngine::new(config);
/// let token = block_on(engine.sign(Claims::empty().with("sub", "alice")))?;
/// let claims = block_on(engine.verify(&token))?;
/// assert_eq!(claims.get("sub").unwrap(), "alice");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JwtEngine {
    config: Configuration,
    resolved: Option<ResolvedAlgorithm>,
}

/// Outcome of parsing key material for a single role.
#[derive(Debug)]
enum PreparedKey<K> {
    Missing(KeyRole),
    Malformed(Arc<anyhow::Error>),
    Ready(Arc<K>),
}

// Not derived: parsed keys are shared rather than cloned.
impl<K> Clone for PreparedKey<K> {
    fn clone(&self) -> Self {
        match self {
            Self::Missing(role) => Self::Missing(*role),
            Self::Malformed(err) => Self::Malformed(Arc::clone(err)),
            Self::Ready(key) => Self::Ready(Arc::clone(key)),
        }
    }
}

impl<K> PreparedKey<K> {
    fn new(
        spec: &AlgorithmSpec,
        role: Option<KeyRole>,
        config: &Configuration,
        parse: impl FnOnce(&[u8]) -> anyhow::Result<K>,
    ) -> Self {
        let material = match role {
            None => &[][..],
            Some(role) => match config.key(role) {
                Some(material) => material,
                None => return Self::Missing(role),
            },
        };
        match parse(material) {
            Ok(key) => Self::Ready(Arc::new(key)),
            Err(err) => {
                tracing::warn!(
                    algorithm = spec.name(),
                    ?role,
                    error = %format_args!("{err:#}"),
                    "cannot parse key"
                );
                Self::Malformed(Arc::new(err))
            }
        }
    }
}

/// Algorithm resolved from the configuration together with its parsed keys.
#[derive(Debug, Clone)]
struct ResolvedAlgorithm {
    spec: &'static AlgorithmSpec,
    signing_key: PreparedKey<SigningKey>,
    verifying_key: PreparedKey<VerifyingKey>,
}

impl ResolvedAlgorithm {
    fn new(config: &Configuration) -> Option<Self> {
        let Ok(spec) = alg::lookup(config.algorithm()) else {
            tracing::warn!(
                algorithm = config.algorithm(),
                "engine configured with an unsupported algorithm"
            );
            return None;
        };
        Some(Self {
            spec,
            signing_key: PreparedKey::new(spec, spec.signing_key(), config, |material| {
                spec.parse_signing_key(material)
            }),
            verifying_key: PreparedKey::new(spec, spec.verifying_key(), config, |material| {
                spec.parse_verifying_key(material)
            }),
        })
    }

    fn signing_key(&self) -> Result<&SigningKey, ConfigError> {
        match &self.signing_key {
            PreparedKey::Ready(key) => Ok(&**key),
            PreparedKey::Missing(role) => Err(ConfigError::MissingKey {
                algorithm: self.spec.name(),
                role: *role,
            }),
            PreparedKey::Malformed(err) => Err(ConfigError::MalformedKey(anyhow!("{err:#}"))),
        }
    }

    fn verifying_key(&self) -> Result<&VerifyingKey, SignatureError> {
        match &self.verifying_key {
            PreparedKey::Ready(key) => Ok(&**key),
            PreparedKey::Missing(role) => Err(SignatureError::MissingKey {
                algorithm: self.spec.name(),
                role: *role,
            }),
            PreparedKey::Malformed(err) => Err(SignatureError::MalformedKey(anyhow!("{err:#}"))),
        }
    }
}

impl JwtEngine {
    /// Creates an engine with the specified configuration.
    pub fn new(config: Configuration) -> Self {
        let resolved = ResolvedAlgorithm::new(&config);
        Self { config, resolved }
    }

    fn refresh(&mut self) {
        self.resolved = ResolvedAlgorithm::new(&self.config);
    }

    /// Returns all supported algorithms in their canonical order.
    pub fn supported_algorithms() -> &'static [AlgorithmSpec] {
        alg::supported()
    }

    /// Returns the engine configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    /// Changes the algorithm.
    pub fn set_algorithm(&mut self, algorithm: impl Into<String>) {
        self.config.set_algorithm(algorithm.into());
        self.refresh();
    }

    /// Sets the symmetric secret for HMAC algorithms.
    pub fn set_secret(&mut self, secret: impl Into<SecretBytes<'static>>) {
        self.config.set_secret(secret.into());
        self.refresh();
    }

    /// Sets the PEM-encoded private key for RSA and ECDSA algorithms.
    pub fn set_private_key(&mut self, pem: impl Into<String>) {
        self.config.set_private_key(pem.into());
        self.refresh();
    }

    /// Sets the PEM-encoded public key for RSA and ECDSA algorithms.
    pub fn set_public_key(&mut self, pem: impl Into<String>) {
        self.config.set_public_key(pem.into());
        self.refresh();
    }

    /// Sets default claims included into every issued token.
    pub fn set_default_claims(&mut self, claims: Claims) {
        self.config.set_claims(claims);
    }

    /// Sets default header extensions included into every issued token.
    pub fn set_header(&mut self, header: Header) {
        self.config.set_header(header);
    }

    /// Sets validations applied by [`Self::verify()`].
    pub fn set_validations(&mut self, validations: ValidationSet) {
        self.config.set_validations(validations);
    }

    /// Sets the clock and leeway.
    pub fn set_time_options(&mut self, time_options: TimeOptions) {
        self.config.set_time_options(time_options);
    }

    fn algorithm(&self) -> Result<&ResolvedAlgorithm, ConfigError> {
        self.resolved
            .as_ref()
            .ok_or_else(|| ConfigError::UnsupportedAlgorithm(self.config.algorithm().to_owned()))
    }

    /// Issues a token with the default claims overridden by `claims`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the algorithm is unsupported, the signing key is absent
    /// or unusable, or a reserved claim is not a numeric timestamp.
    pub async fn sign(&self, claims: Claims) -> Result<String, Error> {
        self.create_token(claims, &Header::empty())
    }

    /// Issues a token with the default claims overridden by `claims`, and the default
    /// header extensions overridden by `header`.
    ///
    /// # Errors
    ///
    /// See [`Self::sign()`].
    pub async fn sign_with_header(&self, claims: Claims, header: &Header) -> Result<String, Error> {
        self.create_token(claims, header)
    }

    fn create_token(&self, claims: Claims, header: &Header) -> Result<String, Error> {
        let resolved = self.algorithm()?;
        let spec = resolved.spec;
        let key = resolved.signing_key()?;

        let header = self.config.header().merged(header).complete(spec.name());
        let claims = Claims::merge(self.config.claims(), claims)
            .resolve_for_signing(self.config.time_options().now())?;

        let mut buffer = encode_json(&header).map_err(ConfigError::Header)?;
        buffer.push('.');
        buffer.push_str(&encode_json(&claims).map_err(ConfigError::Claims)?);

        let signature = spec.sign(key, buffer.as_bytes())?;
        buffer.push('.');
        buffer.push_str(&base64url_encode(signature));

        tracing::debug!(
            algorithm = spec.name(),
            claims = claims.len(),
            "issued token"
        );
        Ok(buffer)
    }

    /// Checks the token structure and signature without validating claims.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the token is malformed, [`Error::Config`] if
    /// the algorithm is unsupported, and [`Error::Signature`] if the signature cannot be trusted.
    pub fn verify_integrity(&self, token: &str) -> Result<Claims, Error> {
        let token = UntrustedToken::new(token)?;
        let resolved = self.algorithm()?;
        let spec = resolved.spec;
        if token.algorithm() != Some(spec.name()) {
            return Err(SignatureError::AlgorithmMismatch {
                expected: spec.name().to_owned(),
                actual: token.algorithm().map(str::to_owned),
            }
            .into());
        }

        let key = resolved.verifying_key()?;
        let signature = base64url_decode(token.signature())
            .map_err(|err| SignatureError::MalformedSignature(anyhow!(err)))?;
        spec.verify(key, token.signed_data().as_bytes(), &signature)?;
        Ok(token.into_claims())
    }

    /// Verifies the token signature, then validates its claims as per the configured
    /// [`ValidationSet`]. Returns the token claims on success.
    ///
    /// If the configured custom validator never resolves its continuation, the returned
    /// future never completes; use a timeout (e.g., `tokio::time::timeout`) if necessary.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, see [`Error`].
    pub async fn verify(&self, token: &str) -> Result<Claims, Error> {
        let outcome = match self.verify_integrity(token) {
            Ok(claims) => {
                let validator =
                    ClaimsValidator::new(self.config.validations(), self.config.time_options());
                validator.validate(claims).await
            }
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(_) => tracing::debug!(algorithm = self.config.algorithm(), "verified token"),
            Err(err) => tracing::debug!(
                algorithm = self.config.algorithm(),
                kind = ?err.kind(),
                "token rejected"
            ),
        }
        outcome
    }

    /// Decodes token claims **without** verifying the signature or validating claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed.
    pub fn decode(&self, token: &str) -> Result<Claims, EncodingError> {
        UntrustedToken::new(token).map(UntrustedToken::into_claims)
    }
}
