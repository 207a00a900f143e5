//! [JSON web token (JWT)][JWT] engine with runtime algorithm selection.
//!
//! The engine issues and verifies compact tokens (`header.claims.signature`) with
//! an algorithm and key material taken from its [`Configuration`], and runs verified claims
//! through a validation pipeline: expiration, maturity, and an optional caller-supplied
//! [`CustomValidator`].
//!
//! # Design choices
//!
//! - Algorithms are identified by their JWS names (`HS256`, `ES384`, ...) and resolved
//!   against a static [registry](alg::supported()) once per configuration. Unknown names,
//!   including the RSA-PSS family, are rejected rather than mapped to something similar.
//! - The engine trusts only its configured algorithm. The `alg` field of a presented token
//!   must match it, which eliminates [algorithm switching attacks][switching].
//! - Verification reconstructs the signing input from the original encoded segments
//!   of the token, never from re-encoded data.
//! - Claims are an ordered JSON object ([`Claims`]). Default claims from the configuration
//!   are merged with per-call claims; same-named claims are replaced entirely.
//!
//! ## Supported algorithms
//!
//! | Algorithm(s) | Backend | Keys |
//! |--------------|---------|------|
//! | `none` | - | - |
//! | `HS256`, `HS384`, `HS512` | [`hmac`] + [`sha2`] | Shared secret |
//! | `RS256`, `RS384`, `RS512` | [`rsa`] (PKCS#1 v1.5, blinded) | PKCS#8 / PKCS#1 PEM |
//! | `ES256`, `ES384`, `ES512` | [`p256`], [`p384`], [`p521`] | PKCS#8 / SEC1 PEM |
//!
//! [JWT]: https://jwt.io/
//! [switching]: https://auth0.com/blog/critical-vulnerabilities-in-json-web-token-libraries/
//! [`hmac`]: https://docs.rs/hmac/
//! [`sha2`]: https://docs.rs/sha2/
//! [`rsa`]: https://docs.rs/rsa/
//! [`p256`]: https://docs.rs/p256/
//! [`p384`]: https://docs.rs/p384/
//! [`p521`]: https://docs.rs/p521/
//!
//! # Examples
//!
//! Basic JWT lifecycle:
//!
//! ```
//! use chrono::Duration;
//! use futures::executor::block_on;
//! use jwt_engine::{alg::Algorithm, prelude::*};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Configuration::new(Algorithm::Hs256)
//!     .with_secret(b"super_secret_key_donut_steel".to_vec())
//!     .with_claims(Claims::empty().with("iss", "auth.example.com").issue_at_signing())
//!     .with_header(Header::empty().with_key_id("my-key"));
//! let engine = JwtEngine::new(config);
//!
//! // Create a token.
//! let time_options = TimeOptions::default();
//! let claims = Claims::empty()
//!     .with("sub", "alice")
//!     .set_duration(&time_options, Duration::days(7));
//! let token_string = block_on(engine.sign(claims))?;
//!
//! // Before verifying the token, we might find the key which has signed the token
//! // using the `kid` header field.
//! let token = UntrustedToken::new(&token_string)?;
//! assert_eq!(token.header().key_id(), Some("my-key"));
//!
//! // Verify the token and validate its claims.
//! let claims = block_on(engine.verify(&token_string))?;
//! assert_eq!(claims.get("sub").unwrap(), "alice");
//! assert_eq!(claims.get("iss").unwrap(), "auth.example.com");
//! assert!(claims.issued_at().is_some());
//! # Ok(())
//! # } // end main()
//! ```
//!
//! Custom validation:
//!
//! ```
//! # use futures::executor::block_on;
//! # use jwt_engine::{alg::Algorithm, prelude::*, ErrorKind};
//! # fn main() -> anyhow::Result<()> {
//! let validator = CustomValidator::new(|claims: Claims, cont: Continuation| {
//!     match claims.get("role").and_then(|role| role.as_str()) {
//!         Some("admin") => cont.pass(),
//!         _ => cont.fail("admin role required"),
//!     }
//! });
//! let config = Configuration::new(Algorithm::Hs512)
//!     .with_secret(b"super_secret_key_donut_steel".to_vec())
//!     .with_validations(ValidationSet::default().with_custom(validator));
//! let engine = JwtEngine::new(config);
//!
//! let token = block_on(engine.sign(Claims::empty().with("role", "user")))?;
//! let err = block_on(engine.verify(&token)).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Validation);
//! assert_eq!(err.to_string(), "Claims rejected: admin role required");
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unused_async
)]

pub mod alg;
mod claims;
mod config;
pub mod encoding;
mod engine;
mod error;
mod token;
mod validation;

/// Prelude to neatly import all necessary stuff from the crate.
pub mod prelude {
    pub use crate::{
        Claims, Configuration, Continuation, CustomValidator, Header, JwtEngine, TimeOptions,
        UntrustedToken, ValidationSet,
    };
}

pub use crate::{
    claims::{Claims, TimeOptions},
    config::Configuration,
    engine::JwtEngine,
    error::{Claim, ConfigError, EncodingError, Error, ErrorKind, SignatureError},
    token::{Header, UntrustedToken},
    validation::{ClaimsValidator, Continuation, CustomValidator, ValidationSet},
};
