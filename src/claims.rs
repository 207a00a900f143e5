use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::{fmt, sync::Arc};

use crate::{Claim, ConfigError, Error};

type ClockFn = dyn Fn() -> DateTime<Utc> + Send + Sync;

/// Time-related options: the source of the current time and the leeway applied
/// to `exp` / `nbf` checks.
#[derive(Clone)]
#[non_exhaustive]
pub struct TimeOptions {
    /// Leeway to use during validation.
    pub leeway: Duration,
    clock_fn: Arc<ClockFn>,
}

impl fmt::Debug for TimeOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TimeOptions")
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl TimeOptions {
    /// Creates options based on the specified time leeway and clock function.
    pub fn new<F>(leeway: Duration, clock_fn: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            leeway,
            clock_fn: Arc::new(clock_fn),
        }
    }

    /// Creates options based on the specified time leeway. The clock source is [`Utc::now()`].
    pub fn from_leeway(leeway: Duration) -> Self {
        Self::new(leeway, Utc::now)
    }

    /// Returns the current time according to the clock function.
    pub fn now(&self) -> DateTime<Utc> {
        (self.clock_fn)()
    }
}

/// Zero leeway and the system clock.
impl Default for TimeOptions {
    fn default() -> Self {
        Self::from_leeway(Duration::zero())
    }
}

/// Claims encoded in a token.
///
/// Claims are an ordered JSON object. The reserved `exp`, `nbf` and `iat` claims
/// hold UNIX timestamps (seconds), which may be fractional; all other claims are opaque
/// to the engine.
///
/// When issuing a token, `iat` may also be set to `true`, in which case it is replaced
/// with the current time (see [`Self::issue_at_signing()`]), or to `false`, in which case
/// it is omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Creates an empty claims instance.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a claim, replacing a same-named one if present.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a claim, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Gets a claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Removes a claim by name.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns the claims as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Converts the claims into a JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Returns the number of claims.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether there are no claims.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over claims in their insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    fn timestamp(&self, claim: Claim) -> Option<i64> {
        self.0
            .get(claim.name())
            .and_then(|value| rounded_timestamp(value, f64::floor))
    }

    /// Returns the `exp` claim, if it is present and is a number. Fractional timestamps
    /// are rounded down.
    pub fn expiration(&self) -> Option<i64> {
        self.timestamp(Claim::Expiration)
    }

    /// Returns the `nbf` claim, if it is present and is a number. Fractional timestamps
    /// are rounded down.
    pub fn not_before(&self) -> Option<i64> {
        self.timestamp(Claim::NotBefore)
    }

    /// Returns the `iat` claim, if it is present and is a number. Fractional timestamps
    /// are rounded down.
    pub fn issued_at(&self) -> Option<i64> {
        self.timestamp(Claim::IssuedAt)
    }

    /// Gets a reserved claim for validation, rounding fractional values with `round`.
    /// Absent claims yield `Ok(None)`; non-numeric ones are rejected.
    fn checked_timestamp(
        &self,
        claim: Claim,
        round: fn(f64) -> f64,
    ) -> Result<Option<i64>, Error> {
        let Some(value) = self.0.get(claim.name()) else {
            return Ok(None);
        };
        rounded_timestamp(value, round)
            .map(Some)
            .ok_or_else(|| Error::validation(format!("claim `{claim}` must be a number")))
    }

    /// Sets the `exp` claim.
    #[must_use]
    pub fn set_expiration(self, moment: DateTime<Utc>) -> Self {
        self.with(Claim::Expiration.name(), moment.timestamp())
    }

    /// Sets the `nbf` claim.
    #[must_use]
    pub fn set_not_before(self, moment: DateTime<Utc>) -> Self {
        self.with(Claim::NotBefore.name(), moment.timestamp())
    }

    /// Sets the `iat` claim.
    #[must_use]
    pub fn set_issued_at(self, moment: DateTime<Utc>) -> Self {
        self.with(Claim::IssuedAt.name(), moment.timestamp())
    }

    /// Sets `iat` to `true`, so that it is replaced with the current time when the token
    /// is issued.
    #[must_use]
    pub fn issue_at_signing(self) -> Self {
        self.with(Claim::IssuedAt.name(), true)
    }

    /// Sets the `exp` claim so that the token has the specified `duration`.
    #[must_use]
    pub fn set_duration(self, options: &TimeOptions, duration: Duration) -> Self {
        let expiration = options.now() + duration;
        self.set_expiration(expiration)
    }

    /// Atomically sets `iat` and `exp` claims: first to the current time,
    /// and the second to match the specified `duration` of the token.
    #[must_use]
    pub fn set_duration_and_issuance(self, options: &TimeOptions, duration: Duration) -> Self {
        let issued_at = options.now();
        self.set_issued_at(issued_at)
            .set_expiration(issued_at + duration)
    }

    /// Merges `overrides` on top of `defaults`. Same-named claims are replaced entirely;
    /// the order of claims from `defaults` is retained.
    pub(crate) fn merge(defaults: &Self, overrides: Self) -> Self {
        let mut merged = defaults.0.clone();
        merged.extend(overrides.0);
        Self(merged)
    }

    /// Prepares merged claims for issuance: resolves `iat: true` to `now` and drops
    /// `iat: false`, then checks that all reserved claims are numbers. Numbers
    /// (including fractional ones) are passed through unchanged.
    pub(crate) fn resolve_for_signing(mut self, now: DateTime<Utc>) -> Result<Self, ConfigError> {
        let issued_at = self.0.get(Claim::IssuedAt.name()).and_then(Value::as_bool);
        match issued_at {
            Some(true) => {
                self.insert(Claim::IssuedAt.name(), now.timestamp());
            }
            Some(false) => {
                self.remove(Claim::IssuedAt.name());
            }
            None => { /* used verbatim */ }
        }
        self.malformed_claim().map_or(Ok(self), |claim| {
            Err(ConfigError::MalformedClaim(claim))
        })
    }

    fn malformed_claim(&self) -> Option<Claim> {
        [Claim::Expiration, Claim::NotBefore, Claim::IssuedAt]
            .into_iter()
            .find(|claim| {
                self.0
                    .get(claim.name())
                    .is_some_and(|value| !value.is_number())
            })
    }

    /// Validates the expiration claim.
    ///
    /// This method will return an error if the `exp` claim is in the past (subject to the
    /// provided `options`), or is not a number. Claims without `exp` pass the check.
    pub fn validate_expiration(&self, options: &TimeOptions) -> Result<&Self, Error> {
        // `now` is whole seconds, so `now > exp` iff `now > floor(exp)`.
        let Some(expiration) = self.checked_timestamp(Claim::Expiration, f64::floor)? else {
            return Ok(self);
        };
        let now = options.now().timestamp();
        if now > expiration.saturating_add(options.leeway.num_seconds()) {
            Err(Error::Expired {
                expired_at: expiration,
            })
        } else {
            Ok(self)
        }
    }

    /// Validates the maturity time (`nbf` claim).
    ///
    /// This method will return an error if the `nbf` claim is in the future (subject to the
    /// provided `options`), or is not a number. Claims without `nbf` pass the check.
    pub fn validate_maturity(&self, options: &TimeOptions) -> Result<&Self, Error> {
        let Some(not_before) = self.checked_timestamp(Claim::NotBefore, f64::ceil)? else {
            return Ok(self);
        };
        let now = options.now().timestamp();
        if now < not_before.saturating_sub(options.leeway.num_seconds()) {
            Err(Error::NotYetValid {
                invalid_before: not_before,
            })
        } else {
            Ok(self)
        }
    }
}

/// Converts a JSON number to whole seconds. Out-of-range values saturate.
#[allow(clippy::cast_possible_truncation)]
fn rounded_timestamp(value: &Value, round: fn(f64) -> f64) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|timestamp| round(timestamp) as i64))
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Claims> for Map<String, Value> {
    fn from(claims: Claims) -> Self {
        claims.0
    }
}
