use std::{
    fmt::{self, Debug, Display},
    num::NonZeroU128,
    str::FromStr,
};

use serde::{
    de::{Error, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};

/// 128-bit globally unique resource identifier.
///
/// Textual form is 32 lowercase hex digits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ResourceId(pub NonZeroU128);

impl Serialize for ResourceId {
    #[inline(always)]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u128(self.0.get())
        }
    }
}

struct ResourceIdVisitor;

impl<'de> serde::de::Visitor<'de> for ResourceIdVisitor {
    type Value = ResourceId;

    #[inline(always)]
    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a non-zero 128-bit integer or a hex string")
    }

    #[inline(always)]
    fn visit_u64<E>(self, v: u64) -> Result<ResourceId, E>
    where
        E: Error,
    {
        self.visit_u128(v as u128)
    }

    #[inline(always)]
    fn visit_u128<E>(self, v: u128) -> Result<ResourceId, E>
    where
        E: Error,
    {
        match NonZeroU128::new(v) {
            None => Err(E::invalid_value(Unexpected::Unsigned(0), &self)),
            Some(value) => Ok(ResourceId(value)),
        }
    }

    #[inline(always)]
    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    #[inline(always)]
    fn deserialize<D>(deserializer: D) -> Result<ResourceId, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            deserializer.deserialize_str(ResourceIdVisitor)
        } else {
            deserializer.deserialize_u128(ResourceIdVisitor)
        }
    }
}

/// Length of the textual form.
const HEX_DIGITS: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseResourceIdError {
    #[error("ResourceId '{0}' must be exactly 32 hex digits")]
    InvalidFormat(String),

    #[error("ResourceId cannot be zero")]
    ZeroId,
}

impl FromStr for ResourceId {
    type Err = ParseResourceIdError;

    /// Parses the 32-digit hex form produced by `Display`.
    /// Either letter case is accepted.
    fn from_str(s: &str) -> Result<Self, ParseResourceIdError> {
        if s.len() != HEX_DIGITS || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseResourceIdError::InvalidFormat(s.to_owned()));
        }

        let value = u128::from_str_radix(s, 16)
            .map_err(|_| ParseResourceIdError::InvalidFormat(s.to_owned()))?;
        match NonZeroU128::new(value) {
            None => Err(ParseResourceIdError::ZeroId),
            Some(value) => Ok(ResourceId(value)),
        }
    }
}

#[derive(Debug)]
pub struct ZeroIDError;

impl ResourceId {
    #[inline(always)]
    pub const fn new(value: u128) -> Option<Self> {
        match NonZeroU128::new(value) {
            None => None,
            Some(value) => Some(ResourceId(value)),
        }
    }
}

impl TryFrom<u128> for ResourceId {
    type Error = ZeroIDError;

    fn try_from(value: u128) -> Result<Self, ZeroIDError> {
        match NonZeroU128::try_from(value) {
            Ok(value) => Ok(ResourceId(value)),
            Err(_) => Err(ZeroIDError),
        }
    }
}

impl Debug for ResourceId {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0.get())
    }
}

impl Display for ResourceId {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0.get())
    }
}

/// Defines a strongly typed handle over non-zero 64-bit value.
macro_rules! make_id {
    (
        $(#[$meta:meta])+
        $vis:vis $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name {
            value: ::core::num::NonZeroU64,
        }

        impl ::core::fmt::Debug for $name {
            #[inline(always)]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.value)
            }
        }

        impl ::core::fmt::Display for $name {
            #[inline(always)]
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.value, f)
            }
        }

        impl $name {
            #[allow(unused)]
            #[inline(always)]
            pub(crate) const fn new(value: ::core::num::NonZeroU64) -> Self {
                $name { value }
            }

            #[allow(unused)]
            #[inline(always)]
            pub const fn get(self) -> u64 {
                self.value.get()
            }
        }
    };
}

pub(crate) use make_id;
