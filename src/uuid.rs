//! Session identifiers with fast random generation.
//!
//! A [`SessionId`] keys a player's round in
//! [`Sessions`](crate::session::Sessions). It wraps a `uuid::Uuid` and is
//! generated with `fastrand`, which is fast but predictable: do not use
//! session ids as secrets.
//!
//! # Example
//! ```
//! use std::str::FromStr;
//! use spotle::uuid::SessionId;
//!
//! let id = SessionId::fast_v4();
//! let parsed = SessionId::from_str(&id.to_string())?;
//! assert_eq!(id, parsed);
//! ```

use std::{fmt, ops::Deref, str::FromStr};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub uuid::Uuid);

impl Deref for SessionId {
    type Target = uuid::Uuid;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl SessionId {
    /// Generates a new random UUID v4 using a fast random number generator.
    #[must_use]
    pub fn fast_v4() -> Self {
        let random_bytes = fastrand::u128(..).to_ne_bytes();
        let uuid = uuid::Builder::from_random_bytes(random_bytes).into_uuid();
        Self(uuid)
    }
}

impl From<uuid::Uuid> for SessionId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::from_str(s)?;
        Ok(Self(uuid))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_version_4() {
        let id = SessionId::fast_v4();
        assert_eq!(id.get_version_num(), 4);
        assert_ne!(id, SessionId::fast_v4());
    }

    #[test]
    fn parses_own_display() {
        let id = SessionId::fast_v4();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().unwrap_err().kind
            == crate::error::ErrorKind::InvalidArgument);
    }
}
