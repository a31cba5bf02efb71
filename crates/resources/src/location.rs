use std::{fmt, str::FromStr};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::id::{ParseResourceIdError, ResourceId};

/// Names a resource independently of its physical path.
///
/// Protocol selects catalogue and provider pair,
/// id is looked up in the catalogue to get the path.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Location {
    protocol: String,
    id: ResourceId,
}

/// Checks that protocol name survives text form round trip.
/// Protocol must be non-empty and must not contain `:`.
pub fn is_valid_protocol(protocol: &str) -> bool {
    !protocol.is_empty() && !protocol.contains(':')
}

impl Location {
    /// Creates new location.
    ///
    /// # Panics
    ///
    /// Panics if protocol is empty or contains `:`.
    /// Use [`Location::try_new`] for unchecked input.
    pub fn new(protocol: impl Into<String>, id: ResourceId) -> Self {
        match Location::try_new(protocol, id) {
            Ok(location) => location,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(
        protocol: impl Into<String>,
        id: ResourceId,
    ) -> Result<Self, ParseLocationError> {
        let protocol = protocol.into();
        if !is_valid_protocol(&protocol) {
            return Err(ParseLocationError::InvalidProtocol(protocol));
        }
        Ok(Location { protocol, id })
    }

    #[inline(always)]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[inline(always)]
    pub fn id(&self) -> ResourceId {
        self.id
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.protocol, self.id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseLocationError {
    #[error("Location '{0}' must have form '<protocol>:<id>'")]
    MissingSeparator(String),

    #[error("Location '{0}' has empty protocol")]
    EmptyProtocol(String),

    #[error("Protocol '{0}' must be non-empty and must not contain ':'")]
    InvalidProtocol(String),

    #[error("Location '{location}' has invalid id. {error}")]
    InvalidId {
        location: String,
        error: ParseResourceIdError,
    },
}

impl FromStr for Location {
    type Err = ParseLocationError;

    fn from_str(s: &str) -> Result<Self, ParseLocationError> {
        let (protocol, id) = s
            .split_once(':')
            .ok_or_else(|| ParseLocationError::MissingSeparator(s.to_owned()))?;

        if protocol.is_empty() {
            return Err(ParseLocationError::EmptyProtocol(s.to_owned()));
        }

        let id = id.parse().map_err(|error| ParseLocationError::InvalidId {
            location: s.to_owned(),
            error,
        })?;

        Location::try_new(protocol, id)
    }
}

impl Serialize for Location {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> Result<Location, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
