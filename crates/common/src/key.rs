//! Primitive cache keys
//!
//! Caches never serialize request arguments themselves; callers map their
//! arguments to a [`CacheKey`], either an integer or a string.

use std::fmt;

/// Primitive value identifying a cached item or a pending computation.
///
/// # Examples
///
/// ```
/// use orderly_common::CacheKey;
///
/// assert_eq!(CacheKey::from(10), CacheKey::Int(10));
/// assert_eq!(CacheKey::from("user:1").to_string(), "user:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum CacheKey {
    /// Integer key
    Int(i64),
    /// String key
    Str(String),
}

impl CacheKey {
    /// Returns the integer value if this is an integer key.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(_) => None,
        }
    }

    /// Returns the string value if this is a string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Int(_) => None,
            Self::Str(value) => Some(value),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => f.write_str(value),
        }
    }
}

macro_rules! impl_from_int {
    ($($int:ty),* $(,)?) => {
        $(
            impl From<$int> for CacheKey {
                fn from(value: $int) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}
