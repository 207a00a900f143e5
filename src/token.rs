//! `Header`, `UntrustedToken` and parsing of compact tokens.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smallvec::SmallVec;

use core::convert::TryFrom;

use crate::{
    encoding::{base64url_decode, decode_json},
    Claims, EncodingError,
};

const ALGORITHM_FIELD: &str = "alg";
const TYPE_FIELD: &str = "typ";
const KEY_ID_FIELD: &str = "kid";

/// Value of the `typ` field in issued tokens.
const TOKEN_TYPE: &str = "JWT";

/// JWT header extensions.
///
/// The `alg` and `typ` fields are owned by the engine: they are set from the configured
/// algorithm when a token is issued, and extension fields with these names are ignored.
/// All other fields (e.g., `kid`) are copied into the token header verbatim.
///
/// When a token is parsed, the header contains all fields from the token, including
/// `alg` and `typ`. Since these values are provided by the token presenter, they must not
/// be trusted before the token signature is verified.
///
/// ```
/// # use jwt_engine::Header;
/// let header = Header::empty()
///     .with_key_id("my-key-id")
///     .with_field("cty", "JWT");
/// assert_eq!(header.key_id(), Some("my-key-id"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header {
    fields: Map<String, Value>,
}

impl Header {
    /// Creates a header without fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the [`kid`] field for this header.
    ///
    /// [`kid`]: https://www.rfc-editor.org/rfc/rfc7515.html#section-4.1.4
    #[must_use]
    pub fn with_key_id(self, key_id: impl Into<String>) -> Self {
        self.with_field(KEY_ID_FIELD, key_id.into())
    }

    /// Sets an arbitrary field for this header.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Gets the `kid` field, if it is present and is a string.
    pub fn key_id(&self) -> Option<&str> {
        self.fields.get(KEY_ID_FIELD).and_then(Value::as_str)
    }

    /// Gets a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns all header fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Overlays `overrides` on top of this header; same-named fields are replaced.
    pub(crate) fn merged(&self, overrides: &Self) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(overrides.fields.clone());
        Self { fields }
    }

    /// Produces the header object for an issued token: `alg`, `typ`, then extensions.
    pub(crate) fn complete(&self, algorithm: &str) -> Map<String, Value> {
        let mut complete = Map::with_capacity(self.fields.len() + 2);
        complete.insert(ALGORITHM_FIELD.to_owned(), algorithm.into());
        complete.insert(TYPE_FIELD.to_owned(), TOKEN_TYPE.into());
        let extensions = self
            .fields
            .iter()
            .filter(|(name, _)| *name != ALGORITHM_FIELD && *name != TYPE_FIELD);
        complete.extend(extensions.map(|(name, value)| (name.clone(), value.clone())));
        complete
    }
}

impl From<Map<String, Value>> for Header {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Parsed, but unverified token.
///
/// Parsing checks the token structure, and that the header and claims are base64url-encoded
/// JSON objects. The signature segment is kept as is; it is decoded during verification.
/// No cryptographic checks are performed; use [`JwtEngine::verify()`](crate::JwtEngine::verify())
/// to establish trust.
///
/// # Examples
///
/// ```
/// # use jwt_engine::UntrustedToken;
/// # fn main() -> anyhow::Result<()> {
/// let token = UntrustedToken::new(
///     "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCIsImtpZCI6ImtleS0xIn0.\
///      eyJzdWIiOiJhbGljZSJ9.\
///      c2lnbmF0dXJl",
/// )?;
/// assert_eq!(token.algorithm(), Some("HS256"));
/// assert_eq!(token.header().key_id(), Some("key-1"));
/// assert_eq!(token.claims().get("sub").unwrap(), "alice");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UntrustedToken<'a> {
    signed_data: &'a str,
    header: Header,
    algorithm: Option<String>,
    token_type: Option<String>,
    claims: Claims,
    signature: &'a str,
}

fn string_field(
    header: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, EncodingError> {
    match header.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(EncodingError::MalformedHeaderField(name)),
    }
}

impl<'a> TryFrom<&'a str> for UntrustedToken<'a> {
    type Error = EncodingError;

    fn try_from(s: &'a str) -> Result<Self, Self::Error> {
        let token_parts: SmallVec<[&str; 3]> = s.split('.').collect();
        let [header, claims, signature] = &token_parts[..] else {
            return Err(EncodingError::InvalidTokenStructure {
                segments: token_parts.len(),
            });
        };

        let header = decode_json(header)?;
        let claims = Claims::from(decode_json(claims)?);
        let algorithm = string_field(&header, ALGORITHM_FIELD)?;
        let token_type = string_field(&header, TYPE_FIELD)?;

        let signed_data_len = s.len() - signature.len() - 1;
        Ok(Self {
            signed_data: &s[..signed_data_len],
            header: Header::from(header),
            algorithm,
            token_type,
            claims,
            signature: *signature,
        })
    }
}

impl<'a> UntrustedToken<'a> {
    /// Creates an untrusted token from a string. This is a shortcut for calling the [`TryFrom`]
    /// conversion.
    pub fn new<S: AsRef<str> + ?Sized>(s: &'a S) -> Result<Self, EncodingError> {
        Self::try_from(s.as_ref())
    }

    /// Gets the token header, including `alg` and `typ` fields.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Gets the `alg` field from the token header. This value is provided by the token
    /// presenter and is never used to select a verification primitive.
    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    /// Gets the `typ` field from the token header.
    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    /// Gets the unverified token claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Returns the encoded signature segment.
    pub fn signature(&self) -> &'a str {
        self.signature
    }

    /// Decodes signature bytes from the token. These bytes are **not** guaranteed to form
    /// a valid signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature segment is not valid base64url.
    pub fn signature_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        base64url_decode(self.signature)
    }

    /// Original encoded header and claims segments joined with a period.
    pub(crate) fn signed_data(&self) -> &'a str {
        self.signed_data
    }

    /// Converts the token into its unverified claims.
    pub fn into_claims(self) -> Claims {
        self.claims
    }
}
