//! Error handling.

use core::fmt;

use crate::alg::KeyRole;

/// Identifier of a reserved claim in [`Claims`](crate::Claims).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Claim {
    /// `exp` claim (expiration time).
    Expiration,
    /// `nbf` claim (valid not before).
    NotBefore,
    /// `iat` claim (issuance time).
    IssuedAt,
}

impl Claim {
    /// Name of the claim as it appears in the serialized claim set.
    pub fn name(self) -> &'static str {
        match self {
            Self::Expiration => "exp",
            Self::NotBefore => "nbf",
            Self::IssuedAt => "iat",
        }
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Errors caused by the engine configuration. Raised when issuing tokens, and when
/// the configured algorithm is not supported.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Algorithm identifier is not in the registry.
    UnsupportedAlgorithm(String),
    /// Key material required by the algorithm is not configured.
    MissingKey {
        /// Algorithm that requires the key.
        algorithm: &'static str,
        /// Missing key role.
        role: KeyRole,
    },
    /// Configured key cannot be used with the algorithm (e.g., it is not valid PEM,
    /// or belongs to another curve).
    MalformedKey(anyhow::Error),
    /// Reserved claim does not hold a numeric timestamp after the merge.
    MalformedClaim(Claim),
    /// Token header cannot be serialized.
    Header(serde_json::Error),
    /// Token claims cannot be serialized.
    Claims(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm(name) => write!(formatter, "Unsupported algorithm: {name}"),
            Self::MissingKey { algorithm, role } => {
                write!(formatter, "Algorithm {algorithm} requires a {role}, which is not set")
            }
            Self::MalformedKey(err) => write!(formatter, "Malformed signing key: {err}"),
            Self::MalformedClaim(claim) => {
                write!(formatter, "Claim `{claim}` must be a numeric timestamp")
            }
            Self::Header(err) => write!(formatter, "Cannot serialize header: {err}"),
            Self::Claims(err) => write!(formatter, "Cannot serialize claims: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedKey(err) => Some(err.as_ref()),
            Self::Header(err) | Self::Claims(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors that occur while taking a compact token apart. These are raised before
/// any cryptographic operation is attempted.
#[derive(Debug)]
#[non_exhaustive]
pub enum EncodingError {
    /// Token has invalid structure.
    ///
    /// Valid tokens must consist of 3 base64url-encoded parts (header, claims, and signature)
    /// separated by periods.
    InvalidTokenStructure {
        /// Number of segments found in the token.
        segments: usize,
    },
    /// Cannot decode base64url.
    Base64(base64ct::Error),
    /// Segment is not a valid JSON object.
    MalformedJson(serde_json::Error),
    /// Well-known header field has an unexpected type.
    MalformedHeaderField(&'static str),
}

impl fmt::Display for EncodingError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTokenStructure { segments } => write!(
                formatter,
                "Invalid token structure: expected 3 segments, got {segments}"
            ),
            Self::Base64(err) => write!(formatter, "base64url decoding error: {err}"),
            Self::MalformedJson(err) => write!(formatter, "Malformed JSON object: {err}"),
            Self::MalformedHeaderField(field) => {
                write!(formatter, "Header field `{field}` must be a string")
            }
        }
    }
}

impl From<base64ct::Error> for EncodingError {
    fn from(error: base64ct::Error) -> Self {
        Self::Base64(error)
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(err) => Some(err),
            Self::MalformedJson(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors meaning that the token signature cannot be trusted.
#[derive(Debug)]
#[non_exhaustive]
pub enum SignatureError {
    /// Algorithm mentioned in the token header differs from the configured one.
    AlgorithmMismatch {
        /// Configured algorithm name.
        expected: String,
        /// Algorithm in the token header, if any.
        actual: Option<String>,
    },
    /// Key material required for verification is not configured.
    MissingKey {
        /// Algorithm that requires the key.
        algorithm: &'static str,
        /// Missing key role.
        role: KeyRole,
    },
    /// Configured verifying key cannot be parsed.
    MalformedKey(anyhow::Error),
    /// Token signature is malformed (e.g., has an incorrect length).
    MalformedSignature(anyhow::Error),
    /// Token signature has failed verification.
    InvalidSignature,
    /// Unsecured token carries a non-empty signature.
    UnexpectedSignature,
}

impl fmt::Display for SignatureError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlgorithmMismatch {
                expected,
                actual: Some(actual),
            } => write!(
                formatter,
                "Token algorithm ({actual}) differs from expected ({expected})"
            ),
            Self::AlgorithmMismatch {
                expected,
                actual: None,
            } => write!(
                formatter,
                "Token header has no algorithm; expected {expected}"
            ),
            Self::MissingKey { algorithm, role } => {
                write!(formatter, "Algorithm {algorithm} requires a {role}, which is not set")
            }
            Self::MalformedKey(err) => write!(formatter, "Malformed verifying key: {err}"),
            Self::MalformedSignature(err) => write!(formatter, "Malformed token signature: {err}"),
            Self::InvalidSignature => formatter.write_str("Signature has failed verification"),
            Self::UnexpectedSignature => {
                formatter.write_str("Unsecured token must have an empty signature")
            }
        }
    }
}

impl std::error::Error for SignatureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedKey(err) | Self::MalformedSignature(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Coarse kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// See [`Error::Config`].
    Config,
    /// See [`Error::Encoding`].
    Encoding,
    /// See [`Error::Signature`].
    Signature,
    /// See [`Error::Expired`].
    Expired,
    /// See [`Error::NotYetValid`].
    NotYetValid,
    /// See [`Error::Validation`].
    Validation,
}

/// Errors returned by [`JwtEngine`](crate::JwtEngine) operations.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Algorithm is unsupported, or key material is absent or unusable for signing.
    Config(ConfigError),
    /// Token is not a well-formed compact serialization.
    Encoding(EncodingError),
    /// Token signature cannot be trusted.
    Signature(SignatureError),
    /// Token has expired as per its `exp` claim.
    Expired {
        /// Value of the `exp` claim.
        expired_at: i64,
    },
    /// Token is not yet valid as per its `nbf` claim.
    NotYetValid {
        /// Value of the `nbf` claim.
        invalid_before: i64,
    },
    /// Custom validator has rejected the claims.
    Validation(anyhow::Error),
}

impl Error {
    /// Creates a [`Self::Validation`] error with the specified message.
    pub fn validation<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Validation(anyhow::Error::msg(message))
    }

    /// Converts a rejection produced by a custom validator. Engine errors pass through
    /// as-is; everything else is wrapped into [`Self::Validation`].
    pub(crate) fn from_rejection(rejection: anyhow::Error) -> Self {
        rejection.downcast::<Self>().unwrap_or_else(Self::Validation)
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Signature(_) => ErrorKind::Signature,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::NotYetValid { .. } => ErrorKind::NotYetValid,
            Self::Validation(_) => ErrorKind::Validation,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(formatter, "Invalid configuration: {err}"),
            Self::Encoding(err) => write!(formatter, "Malformed token: {err}"),
            Self::Signature(err) => write!(formatter, "Untrusted token: {err}"),
            Self::Expired { expired_at } => write!(formatter, "Token expired at {expired_at}"),
            Self::NotYetValid { invalid_before } => {
                write!(formatter, "Token is not valid before {invalid_before}")
            }
            Self::Validation(err) => write!(formatter, "Claims rejected: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Encoding(err) => Some(err),
            Self::Signature(err) => Some(err),
            Self::Validation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<EncodingError> for Error {
    fn from(error: EncodingError) -> Self {
        Self::Encoding(error)
    }
}

impl From<SignatureError> for Error {
    fn from(error: SignatureError) -> Self {
        Self::Signature(error)
    }
}
