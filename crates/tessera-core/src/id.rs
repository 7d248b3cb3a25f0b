//! Stable content identities

use crate::{Result, TesseraError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the canonical hyphenated form, e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`
const CANONICAL_LEN: usize = 36;

/// Byte offsets of the hyphens in the canonical form
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// A globally unique identifier for a catalog resource.
///
/// Assigned once when a resource is constructed or imported and never
/// reassigned. The canonical string form is the only representation that
/// is ever persisted, so two identities are equal exactly when their
/// canonical strings are equal.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ContentId(Uuid);

impl ContentId {
    /// Generate a fresh random (version 4) identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Rebuild an identity from its canonical string form.
    ///
    /// Only the 36-character hyphenated form is accepted (hex digits may be
    /// either case). Braced, URN and simple forms are rejected so that every
    /// persisted identity has exactly one spelling.
    pub fn from_string(hash: &str) -> Result<Self> {
        let malformed = || TesseraError::MalformedIdentity(hash.to_string());

        if hash.len() != CANONICAL_LEN {
            return Err(malformed());
        }
        for (i, b) in hash.bytes().enumerate() {
            let ok = if HYPHENS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            };
            if !ok {
                return Err(malformed());
            }
        }

        Uuid::parse_str(hash).map(Self).map_err(|_| malformed())
    }

    /// Canonical lowercase hyphenated form
    pub fn to_canonical(&self) -> String {
        self.0.hyphenated().to_string()
    }

    /// Access the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0.hyphenated())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ContentId {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_string(s)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_canonical())
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}
