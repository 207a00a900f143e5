//! Claims validation pipeline: expiration, maturity and an optional custom validator.

use futures::{
    channel::oneshot,
    future::{self, BoxFuture},
};
use serde::Deserialize;

use std::{fmt, sync::Arc};

use crate::{Claims, Error, TimeOptions};

type Callback = dyn Fn(Claims, Continuation) + Send + Sync;
type AsyncCallback = dyn Fn(Claims) -> BoxFuture<'static, Result<(), Error>> + Send + Sync;

/// Single-use handle passed to a [`CustomValidator`] callback. The callback resolves
/// validation by calling exactly one of its methods; since all of them consume the handle,
/// a second resolution cannot be expressed.
///
/// If the handle is dropped without being resolved, the validation never completes.
#[must_use = "validation stalls until the continuation is resolved"]
pub struct Continuation {
    sender: oneshot::Sender<Result<(), Error>>,
}

impl fmt::Debug for Continuation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Continuation").finish_non_exhaustive()
    }
}

impl Continuation {
    /// Accepts the claims.
    pub fn pass(self) {
        self.resume(Ok(()));
    }

    /// Rejects the claims with the specified reason, which is wrapped into
    /// [`Error::Validation`].
    pub fn fail<M>(self, reason: M)
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.resume(Err(Error::validation(reason)));
    }

    /// Rejects the claims with an arbitrary error. If the error is an engine [`Error`],
    /// it is passed through as-is; otherwise, it is wrapped into [`Error::Validation`].
    pub fn reject(self, error: impl Into<anyhow::Error>) {
        self.resume(Err(Error::from_rejection(error.into())));
    }

    /// Resolves validation with the specified outcome.
    pub fn resume(self, outcome: Result<(), Error>) {
        if self.sender.send(outcome).is_err() {
            tracing::debug!("claims validation was abandoned before the continuation was resumed");
        }
    }
}

#[derive(Clone)]
enum ValidatorInner {
    Callback(Arc<Callback>),
    Async(Arc<AsyncCallback>),
}

/// Caller-supplied predicate on token claims, run after expiration and maturity checks.
///
/// # Examples
///
/// Callback-based validator resolving a [`Continuation`]:
///
/// ```
/// # use jwt_engine::{Claims, Continuation, CustomValidator};
/// let validator = CustomValidator::new(|claims: Claims, cont: Continuation| {
///     if claims.get("sub").is_some() {
///         cont.pass();
///     } else {
///         cont.fail("token has no subject");
///     }
/// });
/// ```
///
/// Async validator:
///
/// ```
/// # use jwt_engine::{Claims, CustomValidator, Error};
/// use futures::FutureExt as _;
///
/// let validator = CustomValidator::from_async(|claims: Claims| {
///     async move {
///         // Look up the subject in a database...
///         match claims.get("sub") {
///             Some(_) => Ok(()),
///             None => Err(Error::validation("token has no subject")),
///         }
///     }
///     .boxed()
/// });
/// ```
#[derive(Clone)]
pub struct CustomValidator {
    inner: ValidatorInner,
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.inner {
            ValidatorInner::Callback(_) => "callback",
            ValidatorInner::Async(_) => "async",
        };
        formatter
            .debug_struct("CustomValidator")
            .field("kind", &kind)
            .finish()
    }
}

impl CustomValidator {
    /// Creates a validator from a callback. The callback receives the claims and
    /// a [`Continuation`], which it may resolve synchronously or move into a spawned task.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Claims, Continuation) + Send + Sync + 'static,
    {
        Self {
            inner: ValidatorInner::Callback(Arc::new(callback)),
        }
    }

    /// Creates a validator from an async function.
    pub fn from_async<F>(validator: F) -> Self
    where
        F: Fn(Claims) -> BoxFuture<'static, Result<(), Error>> + Send + Sync + 'static,
    {
        Self {
            inner: ValidatorInner::Async(Arc::new(validator)),
        }
    }

    pub(crate) async fn run(&self, claims: &Claims) -> Result<(), Error> {
        match &self.inner {
            ValidatorInner::Callback(callback) => {
                let (sender, receiver) = oneshot::channel();
                callback(claims.clone(), Continuation { sender });
                match receiver.await {
                    Ok(outcome) => outcome,
                    Err(oneshot::Canceled) => {
                        tracing::warn!(
                            "custom validator dropped its continuation without resolving it; \
                             validation will never complete"
                        );
                        future::pending().await
                    }
                }
            }
            ValidatorInner::Async(validator) => validator(claims.clone()).await,
        }
    }
}

/// Set of validations applied to claims of a token with a verified signature.
///
/// By default, both `exp` and `nbf` checks are enabled, and there is no custom validator.
/// A check for a claim that is absent from the token always succeeds.
///
/// # Deserialization
///
/// Only the `exp` and `nbf` flags are deserialized; a custom validator can only be
/// set programmatically.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSet {
    /// Check the `exp` claim.
    pub exp: bool,
    /// Check the `nbf` claim.
    pub nbf: bool,
    #[serde(skip)]
    custom: Option<CustomValidator>,
}

impl Default for ValidationSet {
    fn default() -> Self {
        Self {
            exp: true,
            nbf: true,
            custom: None,
        }
    }
}

impl ValidationSet {
    /// Creates a set with no validations.
    pub fn none() -> Self {
        Self {
            exp: false,
            nbf: false,
            custom: None,
        }
    }

    /// Enables or disables the `exp` check.
    #[must_use]
    pub fn with_expiration(mut self, enabled: bool) -> Self {
        self.exp = enabled;
        self
    }

    /// Enables or disables the `nbf` check.
    #[must_use]
    pub fn with_not_before(mut self, enabled: bool) -> Self {
        self.nbf = enabled;
        self
    }

    /// Sets the custom validator.
    #[must_use]
    pub fn with_custom(mut self, validator: CustomValidator) -> Self {
        self.custom = Some(validator);
        self
    }

    /// Returns the custom validator, if any.
    pub fn custom(&self) -> Option<&CustomValidator> {
        self.custom.as_ref()
    }
}

/// Validation pipeline for a single token. The checks run in a fixed order
/// (`exp`, then `nbf`, then the custom validator), stopping at the first failure.
#[derive(Debug)]
pub struct ClaimsValidator<'a> {
    validations: &'a ValidationSet,
    time_options: &'a TimeOptions,
}

impl<'a> ClaimsValidator<'a> {
    /// Creates a validator.
    pub fn new(validations: &'a ValidationSet, time_options: &'a TimeOptions) -> Self {
        Self {
            validations,
            time_options,
        }
    }

    /// Validates `claims`, returning them unchanged on success.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Expired`], [`Error::NotYetValid`] or the error produced
    /// by the custom validator.
    pub async fn validate(self, claims: Claims) -> Result<Claims, Error> {
        if self.validations.exp {
            claims.validate_expiration(self.time_options)?;
        }
        if self.validations.nbf {
            claims.validate_maturity(self.time_options)?;
        }
        if let Some(custom) = &self.validations.custom {
            custom.run(&claims).await?;
        }
        Ok(claims)
    }
}
