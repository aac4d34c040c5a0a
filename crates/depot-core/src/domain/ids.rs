//! Strongly-typed content identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::DepotError;

/// Sharding slices the identifier at offsets 0..2, 2..4 and 5.., so an id
/// must carry at least this many characters.
const MIN_LEN: usize = 6;

/// Content identifier: lowercase hex digest of an artifact's bytes.
///
/// Doubles as the metadata primary key and the blob storage key. Validated
/// on construction so path sharding can slice without bounds checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Validate an externally-supplied identifier (e.g. a path parameter).
    pub fn new(s: impl Into<String>) -> Result<Self, DepotError> {
        let s = s.into();
        if s.len() < MIN_LEN {
            return Err(DepotError::InvalidIdentifier(format!(
                "identifier too short ({} chars, need at least {MIN_LEN})",
                s.len()
            )));
        }
        if !s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(DepotError::InvalidIdentifier(
                "identifier must be lowercase hex".to_string(),
            ));
        }
        Ok(Self(s))
    }

    /// Build an id from raw digest output. Infallible: hex encoding always
    /// yields valid lowercase hex, and any digest we use is long enough.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = DepotError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}
