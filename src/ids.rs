//! Request identifiers.
//!
//! Every request carries a ULID. An inbound `X-Request-Id` is kept when it is
//! a valid ULID so ids correlate across services; anything else is replaced.

use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// ULID-backed request id, rendered in Crockford base32.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Reuse an inbound header value when it parses, otherwise mint a fresh id.
    #[must_use]
    pub fn resolve(inbound: Option<&str>) -> Self {
        inbound
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}
